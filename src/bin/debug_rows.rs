use pdf_xlsx::{extract_fragments, group_into_rows};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_rows <pdf_path> [max_page | min-max]");
        std::process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("1-3");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(1), b.parse().unwrap_or(3))
    } else {
        (1, range.parse().unwrap_or(3))
    };

    let pages = extract_fragments(&args[1]).expect("Failed to extract");

    for page in pages
        .iter()
        .filter(|p| p.page >= min_page && p.page <= max_page)
    {
        let rows = group_into_rows(&page.fragments);
        println!(
            "=== PAGE {} ({} fragments, {} rows) ===",
            page.page,
            page.fragments.len(),
            rows.len()
        );
        for fragment in &page.fragments {
            println!(
                "  x={:7.1} y={:7.1} h={:5.1} text={:?}",
                fragment.x, fragment.y, fragment.height, fragment.text
            );
        }
        println!("  --");
        for (i, row) in rows.iter().enumerate() {
            println!("  row {:3}: {:?}", i, row);
        }
        println!();
    }
}
