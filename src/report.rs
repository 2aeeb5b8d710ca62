//! Rendering and export of flip results.

use crate::errors::Result;
use crate::models::{FlipCandidate, PriceObservation};
use std::fmt::Write as _;
use std::io::Write;

pub const CSV_HEADER: &str = "Item Name,Lowest Price,Second Lowest Price,Profit";
pub const CSV_SOURCE_COLUMNS: &str = ",Source 1,Source 2";

/// Coin amount with thousands separators, e.g. `1,234,567` or `1,234.5`.
pub fn format_coins(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let rounded = (amount * 10.0).round() / 10.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let tenths = ((abs - abs.trunc()) * 10.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if tenths > 0 {
        let _ = write!(out, ".{}", tenths);
    }
    out
}

fn render_rows(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            // first column left-aligned, numbers right-aligned
            .map(|(i, (cell, w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = *w)
                } else {
                    format!("{:>w$}", cell, w = *w)
                }
            })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    line(&mut out, &header_cells[..]);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    line(&mut out, &rule[..]);
    for row in rows {
        line(&mut out, &row[..]);
    }
    out
}

/// Plain-text table of ranked flips.
pub fn render_flips(flips: &[FlipCandidate]) -> String {
    if flips.is_empty() {
        return "No profitable flips found.\n".to_string();
    }
    let with_components = flips.iter().any(|f| f.component_value.is_some());
    let mut headers = vec!["Item", "Lowest", "Second", "Profit", "Sources"];
    if with_components {
        headers.push("Enchants");
    }

    let rows: Vec<Vec<String>> = flips
        .iter()
        .map(|f| {
            let mut row = vec![
                f.item_key.clone(),
                format_coins(f.lowest_price),
                format_coins(f.second_lowest_price),
                format_coins(f.margin),
                format!("{} / {}", f.lowest_source, f.second_source),
            ];
            if with_components {
                row.push(f.component_value.map(format_coins).unwrap_or_default());
            }
            row
        })
        .collect();
    render_rows(&headers, &rows)
}

/// Observations of one item, cheapest first. `item_key` only labels the empty case.
pub fn render_observations(item_key: &str, observations: &[PriceObservation]) -> String {
    if observations.is_empty() {
        return format!("No observations for {}.\n", item_key);
    }
    let mut sorted: Vec<&PriceObservation> = observations.iter().collect();
    sorted.sort_by(|a, b| a.price().total_cmp(&b.price()));

    let rows: Vec<Vec<String>> = sorted
        .iter()
        .map(|o| {
            vec![
                o.item_key().to_string(),
                format_coins(o.price()),
                o.source().to_string(),
                o.metadata().unwrap_or("").replace('\n', ", "),
            ]
        })
        .collect();
    render_rows(&["Item", "Price", "Source", "Details"], &rows)
}

fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// CSV export with CRLF line endings. The item name is always quoted.
pub fn write_csv<W: Write>(
    writer: &mut W,
    flips: &[FlipCandidate],
    with_sources: bool,
) -> Result<()> {
    write!(writer, "{}", CSV_HEADER)?;
    if with_sources {
        write!(writer, "{}", CSV_SOURCE_COLUMNS)?;
    }
    write!(writer, "\r\n")?;

    for f in flips {
        write!(
            writer,
            "{},{},{},{}",
            csv_quote(&f.item_key),
            f.lowest_price,
            f.second_lowest_price,
            f.margin
        )?;
        if with_sources {
            write!(writer, ",{},{}", f.lowest_source, f.second_source)?;
        }
        write!(writer, "\r\n")?;
    }
    Ok(())
}

pub fn write_json<W: Write>(writer: &mut W, flips: &[FlipCandidate]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, flips)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn flip(name: &str, low: f64, high: f64) -> FlipCandidate {
        FlipCandidate {
            item_key: name.to_string(),
            lowest_price: low,
            second_lowest_price: high,
            margin: high - low,
            lowest_source: SourceKind::ListingPrice,
            second_source: SourceKind::OrderBookBuy,
            component_value: None,
            category: None,
            rarity: None,
        }
    }

    #[test]
    fn coins_are_grouped() {
        assert_eq!(format_coins(0.0), "0");
        assert_eq!(format_coins(999.0), "999");
        assert_eq!(format_coins(1_000.0), "1,000");
        assert_eq!(format_coins(1_234_567.0), "1,234,567");
        assert_eq!(format_coins(1_234.46), "1,234.5");
        assert_eq!(format_coins(-20_000.0), "-20,000");
    }

    #[test]
    fn csv_escapes_quotes_and_uses_crlf() {
        let flips = vec![flip("Midas' \"Gold\" Sword", 100.0, 120.5)];
        let mut out = Vec::new();
        write_csv(&mut out, &flips, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Item Name,Lowest Price,Second Lowest Price,Profit,Source 1,Source 2\r\n\
             \"Midas' \"\"Gold\"\" Sword\",100,120.5,20.5,BIN,Bazaar Buy\r\n"
        );
    }

    #[test]
    fn csv_without_sources_has_four_columns() {
        let mut out = Vec::new();
        write_csv(&mut out, &[flip("A, B", 1.0, 2.0)], false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "\"A, B\",1,2,1");
    }

    #[test]
    fn json_export_reloads() {
        let flips = vec![flip("A", 1.0, 3.0)];
        let mut out = Vec::new();
        write_json(&mut out, &flips).unwrap();
        let back: Vec<FlipCandidate> = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, flips);
    }

    #[test]
    fn table_lists_each_flip() {
        let table = render_flips(&[flip("Hyperion", 900_000_000.0, 950_000_000.0)]);
        assert!(table.contains("Hyperion"));
        assert!(table.contains("50,000,000"));
        assert!(table.contains("BIN / Bazaar Buy"));
        assert!(!table.contains("Enchants"));
        assert_eq!(render_flips(&[]), "No profitable flips found.\n");
    }

    #[test]
    fn observations_sorted_cheapest_first() {
        let obs = vec![
            PriceObservation::new("Stick", 30.0, SourceKind::ListingPrice).unwrap(),
            PriceObservation::new("Stick", 10.0, SourceKind::OrderBookSell).unwrap(),
        ];
        let table = render_observations("stick", &obs);
        let ten = table.find("10").unwrap();
        let thirty = table.find("30").unwrap();
        assert!(ten < thirty);
        assert_eq!(render_observations("stone", &[]), "No observations for stone.\n");
    }
}
