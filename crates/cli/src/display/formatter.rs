use std::collections::BTreeMap;

/// Align `rows` in columns separated by two spaces.
///
/// The header, when given, is printed first and counts towards the column
/// widths. Trailing whitespace is trimmed from every line.
pub fn tabular<R, S>(rows: &[R], header: Option<&[&str]>) -> String
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut lines: Vec<Vec<&str>> = Vec::with_capacity(rows.len() + 1);
    if let Some(header) = header {
        lines.push(header.to_vec());
    }
    for row in rows {
        lines.push(row.as_ref().iter().map(AsRef::as_ref).collect());
    }

    let columns = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            lines
                .iter()
                .filter_map(|line| line.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in &lines {
        let mut rendered = String::new();
        for (col, cell) in line.iter().enumerate() {
            if col > 0 {
                rendered.push_str("  ");
            }
            rendered.push_str(cell);
            let pad = widths[col] - cell.chars().count();
            rendered.extend(std::iter::repeat_n(' ', pad));
        }
        out.push_str(rendered.trim_end());
        out.push('\n');
    }
    out
}

/// A titled `name: count` block, as used by the suite summaries
pub fn summary(title: &str, counts: &BTreeMap<String, usize>) -> String {
    let rows: Vec<[String; 2]> = counts
        .iter()
        .map(|(name, count)| [format!("{name}:"), count.to_string()])
        .collect();
    format!("\n{title}:\n{}", tabular(&rows, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_aligned() {
        let rows = vec![
            vec!["exec-test", "/bin/true"],
            vec!["python-unittest", "t.py:C.test_m"],
        ];
        let out = tabular(&rows, Some(&["Type", "Test"][..]));
        assert_eq!(
            out,
            "Type             Test\n\
             exec-test        /bin/true\n\
             python-unittest  t.py:C.test_m\n"
        );
    }

    #[test]
    fn test_ragged_rows() {
        let rows = vec![vec!["a"], vec!["bb", "c"]];
        assert_eq!(tabular(&rows, None), "a\nbb  c\n");
        let empty: Vec<Vec<&str>> = Vec::new();
        assert_eq!(tabular(&empty, None), "");
    }

    #[test]
    fn test_summary() {
        let counts = BTreeMap::from([("tap".to_string(), 2), ("exec-test".to_string(), 10)]);
        assert_eq!(
            summary("TEST TYPES SUMMARY", &counts),
            "\nTEST TYPES SUMMARY:\nexec-test:  10\ntap:        2\n"
        );
    }
}
