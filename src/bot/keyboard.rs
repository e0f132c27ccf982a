use crate::bot::registry::HostRecord;
use crate::telegram::{KeyboardButton, KeyboardMarkup};

const BUTTONS_PER_ROW: usize = 2;

/// Lay hosts out two per row, keeping the given order.
/// Callers pass a sorted snapshot so the menu is stable between requests.
pub fn build_keyboard(hosts: &[HostRecord]) -> KeyboardMarkup {
    let rows = hosts
        .chunks(BUTTONS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|host| KeyboardButton {
                    label: host.display_name.clone(),
                    callback_data: host.id.clone(),
                })
                .collect()
        })
        .collect();

    KeyboardMarkup { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn host(id: &str, name: &str) -> HostRecord {
        HostRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            last_seen: Utc::now(),
        }
    }

    fn hosts(n: usize) -> Vec<HostRecord> {
        (0..n)
            .map(|i| host(&format!("id-{i}"), &format!("Host {i}")))
            .collect()
    }

    #[test]
    fn test_two_hosts_single_row() {
        let markup = build_keyboard(&[host("A", "Alpha"), host("B", "Beta")]);
        assert_eq!(markup.rows.len(), 1);
        let labels: Vec<&str> = markup.rows[0].iter().map(|b| b.label.as_str()).collect();
        let data: Vec<&str> = markup.rows[0].iter().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Beta"]);
        assert_eq!(data, vec!["A", "B"]);
    }

    #[test]
    fn test_row_count_and_sizes() {
        for n in 0..=7 {
            let markup = build_keyboard(&hosts(n));
            assert_eq!(markup.rows.len(), n.div_ceil(2), "n = {n}");

            for (i, row) in markup.rows.iter().enumerate() {
                let is_last = i + 1 == markup.rows.len();
                if is_last && n % 2 == 1 {
                    assert_eq!(row.len(), 1);
                } else {
                    assert_eq!(row.len(), 2);
                }
            }
        }
    }

    #[test]
    fn test_preserves_input_order() {
        let input = hosts(5);
        let markup = build_keyboard(&input);
        let flattened: Vec<String> = markup
            .rows
            .into_iter()
            .flatten()
            .map(|b| b.callback_data)
            .collect();
        let expected: Vec<String> = input.into_iter().map(|h| h.id).collect();
        assert_eq!(flattened, expected);
    }
}
