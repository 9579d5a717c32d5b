//! # Seed Data Generator
//!
//! Populates the database with a sample shop catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Catalog
//! A small Vietnamese corner-shop assortment: drinks, instant noodles,
//! snacks and household staples. Each product carries the aliases real
//! customers actually type ("coca", "sting dau", "mi tom"), which is what
//! makes the fuzzy resolver useful out of the box.

use std::env;

use chrono::Utc;
use tally_core::Product;
use tally_db::repository::catalog::generate_product_id;
use tally_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (name, aliases, price in cents, stock, min_stock)
const CATALOG: &[(&str, &[&str], i64, i64, i64)] = &[
    ("Coca Cola lon", &["coca", "coke", "cola"], 12_000, 120, 24),
    ("Pepsi lon", &["pepsi"], 11_000, 96, 24),
    ("Sprite lon", &["sprite", "7up xanh"], 11_000, 72, 24),
    ("Sting dâu", &["sting", "sting dau"], 10_000, 60, 12),
    ("Trà xanh không độ", &["tra xanh", "khong do"], 10_000, 48, 12),
    ("Nước suối Aquafina 500ml", &["nuoc suoi", "aquafina"], 6_000, 200, 48),
    ("Mì Hảo Hảo tôm chua cay", &["hao hao", "mi tom"], 4_500, 300, 60),
    ("Mì Omachi bò", &["omachi"], 8_000, 150, 30),
    ("Bánh mì sandwich", &["banh mi", "sandwich"], 15_000, 30, 10),
    ("Snack Oishi tôm", &["oishi", "snack tom"], 6_000, 80, 20),
    ("Kẹo Mentos", &["mentos", "keo"], 9_000, 50, 10),
    ("Sữa tươi Vinamilk 1L", &["sua tuoi", "vinamilk"], 32_000, 40, 12),
    ("Sữa đặc Ông Thọ", &["sua dac", "ong tho"], 25_000, 36, 8),
    ("Cà phê G7 hộp", &["ca phe", "g7"], 48_000, 25, 6),
    ("Nước mắm Nam Ngư 500ml", &["nuoc mam", "nam ngu"], 28_000, 45, 10),
    ("Dầu ăn Tường An 1L", &["dau an", "tuong an"], 52_000, 30, 8),
    ("Gạo ST25 5kg", &["gao", "st25"], 160_000, 20, 5),
    ("Đường cát trắng 1kg", &["duong", "duong cat"], 22_000, 40, 10),
    ("Muối i-ốt 500g", &["muoi"], 6_000, 50, 10),
    ("Giấy vệ sinh cuộn", &["giay ve sinh", "giay"], 5_000, 100, 24),
    ("Xà phòng Lifebuoy", &["xa phong", "lifebuoy"], 18_000, 35, 8),
    ("Bột giặt Omo 800g", &["bot giat", "omo"], 45_000, 28, 6),
    ("Áo mưa tiện lợi", &["ao mua"], 12_000, 40, 10),
    ("Pin AA Panasonic", &["pin", "pin aa"], 14_000, 60, 12),
    ("Bật lửa ga", &["bat lua", "quet"], 4_000, 90, 20),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let start = std::time::Instant::now();
    let catalog = db.catalog();

    for (name, aliases, price_cents, stock, min_stock) in CATALOG {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: (*name).to_string(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            price_cents: *price_cents,
            stock: *stock,
            min_stock: *min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        catalog.insert(&product).await?;
    }

    let elapsed = start.elapsed();
    println!("✓ Seeded {} products in {:.2?}", CATALOG.len(), elapsed);
    println!();
    println!("Done. Try pasting an order like:");
    println!("  2 coca");
    println!("  hao hao x3");
    println!("  sting dau - 4 cái");

    db.close().await;
    Ok(())
}
