use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};

use helpdesk_utils::formatting::format_ticket_count;
use helpdesk_utils::html::escape_html;

pub const COLUMN_ID: usize = 0;
pub const COLUMN_SUBJECT: usize = 1;
pub const COLUMN_CLIENT: usize = 2;
pub const COLUMN_CATEGORY: usize = 4;
pub const COLUMN_PRIORITY: usize = 5;
pub const COLUMN_STATUS: usize = 6;

/// Option labels that mean "no filter" (ru, kk) wherever they appear.
const ALL_SENTINELS: [&str; 2] = ["Все", "Барлық"];
/// English "no filter" label; only counts as the option's first word.
const ALL_SENTINEL_EN: &str = "All";

pub const MARK_OPEN: &str =
    r#"<mark style="background-color: #fff3cd; padding: 0.1rem 0.2rem; border-radius: 2px;">"#;
pub const MARK_CLOSE: &str = "</mark>";

/// Value of one of the select boxes above the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectFilter {
    #[default]
    All,
    Value(String),
}

impl SelectFilter {
    /// Interpret the selected option; empty or "all"-style labels disable the filter.
    pub fn from_option(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() || is_all_option(value) {
            Self::All
        } else {
            Self::Value(value.to_owned())
        }
    }

    pub fn matches(&self, cell: &str) -> bool {
        match self {
            Self::All => true,
            Self::Value(value) => cell.contains(value.as_str()),
        }
    }
}

fn is_all_option(value: &str) -> bool {
    ALL_SENTINELS.iter().any(|all| value.contains(all))
        || value.split_whitespace().next() == Some(ALL_SENTINEL_EN)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search: String,
    pub status: SelectFilter,
    pub category: SelectFilter,
    pub priority: SelectFilter,
}

impl FilterQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    fn search_term(&self) -> String {
        self.search.trim().to_lowercase()
    }
}

/// One ticket row. `cells` keeps the original text for the lifetime of the
/// table; `html` is re-derived from it on every pass.
#[derive(Clone, Debug)]
pub struct TicketRow {
    cells: Vec<String>,
    html: Vec<String>,
    visible: bool,
}

impl TicketRow {
    pub fn new(cells: Vec<String>) -> Self {
        let html = cells.iter().map(|cell| escape_html(cell)).collect();
        Self {
            cells,
            html,
            visible: true,
        }
    }

    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or_default()
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Cell markup including any highlight.
    pub fn html(&self) -> &[String] {
        &self.html
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn matches(&self, term: &str, query: &FilterQuery) -> bool {
        let matches_search = term.is_empty()
            || [COLUMN_ID, COLUMN_SUBJECT, COLUMN_CLIENT]
                .iter()
                .any(|&column| self.cell(column).to_lowercase().contains(term));

        matches_search
            && query.status.matches(self.cell(COLUMN_STATUS).trim())
            && query.category.matches(self.cell(COLUMN_CATEGORY).trim())
            && query.priority.matches(self.cell(COLUMN_PRIORITY).trim())
    }

    fn highlight(&mut self, pattern: Option<&Regex>) {
        self.html = self
            .cells
            .iter()
            .map(|cell| match pattern {
                Some(pattern) => highlight_cell(cell, pattern),
                None => escape_html(cell),
            })
            .collect();
    }
}

#[derive(Clone, Debug, Default)]
pub struct TicketTable {
    rows: Vec<TicketRow>,
    query: FilterQuery,
    visible_count: usize,
}

impl TicketTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let rows: Vec<TicketRow> = rows.into_iter().map(TicketRow::new).collect();
        let visible_count = rows.len();
        Self {
            rows,
            query: FilterQuery::default(),
            visible_count,
        }
    }

    /// Extract `tbody tr` rows from a server-rendered dashboard page.
    pub fn from_html(html: &str) -> Self {
        let (Ok(row_selector), Ok(cell_selector)) =
            (Selector::parse("tbody tr"), Selector::parse("td"))
        else {
            return Self::default();
        };

        let document = Html::parse_document(html);
        let rows = document
            .select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect();

        Self::new(rows)
    }

    pub fn rows(&self) -> &[TicketRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &TicketRow> {
        self.rows.iter().filter(|row| row.visible)
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn counter_label(&self) -> String {
        format_ticket_count(self.visible_count as u64)
    }

    /// Recompute visibility and highlighting. Returns the visible-row count.
    pub fn apply(&mut self, query: FilterQuery) -> usize {
        let term = query.search_term();
        let pattern = search_pattern(&term);

        let mut visible_count = 0;
        for row in &mut self.rows {
            row.visible = row.matches(&term, &query);
            row.highlight(pattern.as_ref());
            if row.visible {
                visible_count += 1;
            }
        }

        self.query = query;
        self.visible_count = visible_count;
        visible_count
    }

    /// Clear the search box and put every select back on its first option.
    pub fn reset(&mut self) -> usize {
        self.apply(FilterQuery::default())
    }
}

fn search_pattern(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }

    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

fn highlight_cell(text: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for hit in pattern.find_iter(text) {
        out.push_str(&escape_html(&text[cursor..hit.start()]));
        out.push_str(MARK_OPEN);
        out.push_str(&escape_html(hit.as_str()));
        out.push_str(MARK_CLOSE);
        cursor = hit.end();
    }

    out.push_str(&escape_html(&text[cursor..]));
    out
}

#[cfg(test)]
mod tests {
    use super::{FilterQuery, MARK_OPEN, SelectFilter, TicketTable};

    fn row(
        id: &str,
        subject: &str,
        client: &str,
        category: &str,
        priority: &str,
        status: &str,
    ) -> Vec<String> {
        [id, subject, client, "2025-01-10", category, priority, status]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    fn table() -> TicketTable {
        TicketTable::new(vec![
            row("#101", "Нет интернета", "Асель", "Интернет", "Высокий", "Новый"),
            row("#102", "Не работает ТВ", "Данияр", "ТВ", "Средний", "В работе"),
            row("#103", "Медленный интернет", "Ivan", "Интернет", "Низкий", "Закрыт"),
        ])
    }

    fn visible_ids(table: &TicketTable) -> Vec<String> {
        table.visible_rows().map(|row| row.cell(0).to_owned()).collect()
    }

    #[test]
    fn sentinel_options_disable_filters() {
        assert_eq!(SelectFilter::from_option(""), SelectFilter::All);
        assert_eq!(SelectFilter::from_option("Все статусы"), SelectFilter::All);
        assert_eq!(SelectFilter::from_option("Барлық санаттар"), SelectFilter::All);
        assert_eq!(
            SelectFilter::from_option(" Новый "),
            SelectFilter::Value("Новый".to_owned())
        );
    }

    #[test]
    fn english_all_only_counts_as_leading_word() {
        assert_eq!(SelectFilter::from_option("All"), SelectFilter::All);
        assert_eq!(SelectFilter::from_option("All statuses"), SelectFilter::All);
        assert_eq!(
            SelectFilter::from_option("Install"),
            SelectFilter::Value("Install".to_owned())
        );
        assert_eq!(
            SelectFilter::from_option("Allocated"),
            SelectFilter::Value("Allocated".to_owned())
        );
        assert_eq!(
            SelectFilter::from_option("Call back"),
            SelectFilter::Value("Call back".to_owned())
        );
    }

    #[test]
    fn search_matches_id_subject_or_client_case_insensitively() {
        let mut table = table();
        assert_eq!(table.apply(FilterQuery::search("  ИНТЕРНЕТ ")), 2);
        assert_eq!(visible_ids(&table), ["#101", "#103"]);

        assert_eq!(table.apply(FilterQuery::search("ivan")), 1);
        assert_eq!(table.apply(FilterQuery::search("102")), 1);
        assert_eq!(table.counter_label(), "1 тикет");
    }

    #[test]
    fn select_filters_combine_with_search() {
        let mut table = table();
        let query = FilterQuery {
            search: "интернет".to_owned(),
            category: SelectFilter::from_option("Интернет"),
            status: SelectFilter::from_option("Закрыт"),
            priority: SelectFilter::from_option("Все"),
        };

        assert_eq!(table.apply(query), 1);
        assert_eq!(visible_ids(&table), ["#103"]);
    }

    #[test]
    fn search_hits_are_highlighted_in_every_cell() {
        let mut table = table();
        table.apply(FilterQuery::search("интернет"));

        let first = &table.rows()[0];
        assert_eq!(
            first.html()[1],
            format!("Нет {}интернет</mark>а", MARK_OPEN)
        );
        assert!(first.html()[4].contains(MARK_OPEN));
        assert!(!table.rows()[1].html()[1].contains("<mark"));
    }

    #[test]
    fn repeated_filtering_is_idempotent() {
        let mut table = table();
        let query = FilterQuery::search("интернет");

        table.apply(query.clone());
        let first_ids = visible_ids(&table);
        let first_html: Vec<Vec<String>> = table.rows().iter().map(|r| r.html().to_vec()).collect();

        table.apply(query);
        let second_html: Vec<Vec<String>> =
            table.rows().iter().map(|r| r.html().to_vec()).collect();

        assert_eq!(visible_ids(&table), first_ids);
        assert_eq!(second_html, first_html);
        assert_eq!(table.rows()[0].html()[1].matches("<mark").count(), 1);
    }

    #[test]
    fn reset_restores_all_rows_and_plain_text() {
        let mut table = table();
        table.apply(FilterQuery::search("тв"));
        assert_eq!(table.visible_count(), 1);

        assert_eq!(table.reset(), 3);
        assert_eq!(table.counter_label(), "3 тикета");
        assert!(table.rows().iter().all(|row| !row.html().iter().any(|c| c.contains("<mark"))));
    }

    #[test]
    fn highlight_escapes_markup_and_regex_characters() {
        let mut table = TicketTable::new(vec![row("#1", "a+b <x>", "c", "", "", "")]);
        table.apply(FilterQuery::search("a+b"));
        assert_eq!(
            table.rows()[0].html()[1],
            format!("{}a+b</mark> &lt;x&gt;", MARK_OPEN)
        );
    }

    #[test]
    fn extracts_rows_from_dashboard_markup() {
        let html = r#"<table>
            <thead><tr><th>ID</th><th>Тема</th></tr></thead>
            <tbody>
              <tr><td>#7</td><td> Нет интернета </td><td>Асель</td><td>-</td><td>Интернет</td><td>Высокий</td><td>Новый</td></tr>
              <tr><td>#8</td><td>ТВ</td><td>Ivan</td><td>-</td><td>ТВ</td><td>Низкий</td><td>Закрыт</td></tr>
            </tbody>
        </table>"#;

        let mut table = TicketTable::from_html(html);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].cell(1), "Нет интернета");
        assert_eq!(
            table.apply(FilterQuery {
                status: SelectFilter::from_option("Закрыт"),
                ..FilterQuery::default()
            }),
            1
        );
    }
}
