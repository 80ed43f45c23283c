use crate::ingestion::NewsItem;

/// Render the filtered headlines into the analyst prompt.
pub fn render_prompt(items: &[NewsItem]) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a financial analyst. Review these news headlines about NBFCs and Banking.\n");
    prompt.push_str("Identify and summarize ONLY:\n");
    prompt.push_str("1. New Investments (Who invested in whom?)\n");
    prompt.push_str("2. Mergers & Acquisitions (Deals)\n");
    prompt.push_str("3. Major Regulatory Updates affecting the sector\n\n");

    prompt.push_str("Headlines:\n");
    for item in items {
        prompt.push_str(&format_item(item));
        prompt.push('\n');
    }

    prompt.push_str("\nOutput Format:\n");
    prompt.push_str("- **Deals & Investments:** [List details]\n");
    prompt.push_str("- **Top Sector News:** [Major non-deal updates]\n");
    prompt.push_str("If nothing relevant is found in a category, write 'None'.");

    prompt
}

fn format_item(item: &NewsItem) -> String {
    let mut meta = Vec::new();
    if !item.source_name.is_empty() {
        meta.push(item.source_name.clone());
    }
    if let Some(published) = item.published_at {
        meta.push(published.format("%Y-%m-%d").to_string());
    }

    if meta.is_empty() {
        format!("- {} {}", item.title, item.link)
    } else {
        format!("- {} ({}) {}", item.title, meta.join(", "), item.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_prompt_lists_items_in_order() {
        let items = vec![
            NewsItem {
                title: "Tata Capital IPO approved - Mint".to_string(),
                link: "https://x/1".to_string(),
                source_name: "Mint".to_string(),
                published_at: Some(Utc.with_ymd_and_hms(2026, 10, 17, 6, 0, 0).unwrap()),
            },
            NewsItem {
                title: "RBI eases NBFC norms".to_string(),
                link: "https://x/2".to_string(),
                source_name: String::new(),
                published_at: None,
            },
        ];

        let prompt = render_prompt(&items);

        let first = prompt.find("- Tata Capital IPO approved - Mint (Mint, 2026-10-17) https://x/1").unwrap();
        let second = prompt.find("- RBI eases NBFC norms https://x/2").unwrap();
        assert!(first < second);
        assert!(prompt.starts_with("You are a financial analyst."));
        assert!(prompt.ends_with("write 'None'."));
    }
}
