use crate::core::detect::{is_pipe_row, BOX_CHARS};

/// Row/column grid recovered from text. Data rows never carry more cells
/// than the header; shorter rows are kept short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    fn from_rows(mut rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let header = rows.remove(0);
        for row in &mut rows {
            row.truncate(header.len());
        }
        Some(Self { header, rows })
    }
}

/// A document is plain text interleaved with tables, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Table(ParsedTable),
}

/// Splits text into maximal runs of pipe rows and everything else.
pub fn segment_pipe_tables(text: &str) -> Vec<Segment> {
    segment(text, |line, _| is_pipe_row(line), parse_pipe_table)
}

/// Splits text into box-drawn table regions and everything else. Blank lines
/// inside a region stay with the table.
pub fn segment_box_tables(text: &str) -> Vec<Segment> {
    segment(
        text,
        |line, in_table| line.contains(&BOX_CHARS[..]) || (in_table && line.trim().is_empty()),
        parse_box_table,
    )
}

fn segment(
    text: &str,
    belongs: impl Fn(&str, bool) -> bool,
    parse: impl Fn(&[&str]) -> Option<ParsedTable>,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut region: Vec<&str> = Vec::new();

    for line in text.lines() {
        if belongs(line, !region.is_empty()) {
            if region.is_empty() {
                flush_plain(&mut plain, &mut segments);
            }
            region.push(line);
            continue;
        }
        if !region.is_empty() {
            match parse(region.as_slice()) {
                Some(table) => segments.push(Segment::Table(table)),
                None => plain.append(&mut region),
            }
            region.clear();
        }
        plain.push(line);
    }
    if !region.is_empty() {
        match parse(region.as_slice()) {
            Some(table) => {
                flush_plain(&mut plain, &mut segments);
                segments.push(Segment::Table(table));
            }
            None => plain.append(&mut region),
        }
    }
    flush_plain(&mut plain, &mut segments);
    segments
}

fn flush_plain(plain: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if !plain.is_empty() {
        segments.push(Segment::Text(plain.join("\n")));
        plain.clear();
    }
}

/// Parses markdown-style `| a | b |` rows. The first non-separator row is the
/// header.
pub fn parse_pipe_table(lines: &[&str]) -> Option<ParsedTable> {
    let rows: Vec<Vec<String>> = lines
        .iter()
        .filter(|line| !is_pipe_separator(line))
        .map(|line| split_pipe_cells(line))
        .filter(|cells| !cells.is_empty())
        .collect();
    ParsedTable::from_rows(rows)
}

fn is_pipe_separator(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

/// Splits on `|` and trims, dropping the empty fragments that leading and
/// trailing pipes produce. Interior empty cells are kept.
fn split_pipe_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Parses a table drawn with box characters. Cell text that wraps over several
/// physical lines is merged back into one logical row.
pub fn parse_box_table(lines: &[&str]) -> Option<ParsedTable> {
    let boundaries = column_boundaries(lines)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut group: Vec<Vec<String>> = Vec::new();
    for line in lines.iter().filter(|l| is_box_data_line(l)) {
        let cells = extract_cells(line, &boundaries);
        let starts_row = cells.first().is_some_and(|c| !c.is_empty());
        if starts_row && !group.is_empty() {
            rows.push(merge_row_group(&group));
            group.clear();
        }
        group.push(cells);
    }
    if !group.is_empty() {
        rows.push(merge_row_group(&group));
    }
    ParsedTable::from_rows(rows)
}

/// Character offsets of the column junctions on the first border line, with
/// the closing corner or tee as the final boundary.
fn column_boundaries(lines: &[&str]) -> Option<Vec<usize>> {
    let border = lines
        .iter()
        .find(|l| l.contains(&['┌', '├', '┼'][..]))?;
    let chars: Vec<char> = border.chars().collect();

    let mut boundaries: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, '┌' | '├' | '┼' | '┬'))
        .map(|(i, _)| i)
        .collect();
    let end = chars.iter().rposition(|c| matches!(c, '┐' | '┤'))?;
    boundaries.push(end);
    boundaries.dedup();

    (boundaries.len() >= 2).then_some(boundaries)
}

fn is_box_data_line(line: &str) -> bool {
    line.contains('│')
        && !line
            .chars()
            .all(|c| c.is_whitespace() || BOX_CHARS.contains(&c))
}

fn extract_cells(line: &str, boundaries: &[usize]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    boundaries
        .windows(2)
        .map(|w| {
            let start = (w[0] + 1).min(chars.len());
            let end = w[1].min(chars.len());
            let cell: String = chars[start..end.max(start)].iter().collect();
            cell.trim().trim_end_matches('│').trim().to_string()
        })
        .collect()
}

/// Joins each column's non-empty fragments with a single space, in line order.
pub fn merge_row_group(group: &[Vec<String>]) -> Vec<String> {
    let width = group.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            group
                .iter()
                .filter_map(|line| line.get(col))
                .filter(|part| !part.trim().is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
