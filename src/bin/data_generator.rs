use rand::Rng;
use rand::seq::IndexedRandom;
use std::fs::File;
use std::io::{BufWriter, Write};

const STARTUPS: usize = 5_000;
const ROWS: usize = 1_000_000;

const VERTICALS: [&str; 6] = ["Fintech", "Edtech", "E-commerce", "Health", "Transport", "Food"];
const CITIES: [&str; 6] = ["Bengaluru", "Mumbai", "Gurgaon", "New Delhi", "Pune", "Chennai"];
const ROUNDS: [&str; 6] = ["Seed", "Angel", "Series A", "Series B", "Series C", "Series D"];
const INVESTORS: [&str; 8] = [
    "Sequoia Capital",
    "Accel",
    "Tiger Global",
    "SoftBank",
    "Kalaari Capital",
    "Blume Ventures",
    "Nexus Venture Partners",
    "Matrix Partners",
];

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/startup_funding_1m.csv".to_string());
    let file = File::create(&path).unwrap();
    let mut writer = BufWriter::new(file);

    writeln!(writer, "date,startup,vertical,subvertical,city,investors,round,amount").unwrap();

    let mut rng = rand::rng();
    for _ in 0..ROWS {
        let startup = rng.random_range(0..STARTUPS);
        let date = format!(
            "{}-{:02}-{:02}",
            rng.random_range(2015..2021),
            rng.random_range(1..13),
            rng.random_range(1..29)
        );
        let investor_count = rng.random_range(1..4);
        let investors: Vec<&str> = INVESTORS
            .choose_multiple(&mut rng, investor_count)
            .copied()
            .collect();
        let amount = rng.random_range(0.5..500.0f64);
        writeln!(
            writer,
            "{},startup_{},{},sub_{},{},\"{}\",{},{:.2}",
            date,
            startup,
            VERTICALS[startup % VERTICALS.len()],
            startup % 40,
            CITIES[startup % CITIES.len()],
            investors.join(", "),
            ROUNDS.choose(&mut rng).unwrap(),
            amount
        )
        .unwrap();
    }

    println!("Sample funding CSV generated: {}", path);
}
