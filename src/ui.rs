use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pizza_insights::{
    Dashboard, Dataset, Dimension, FilterSelection, ObservedValues, SalesShare, SellerRow, View,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Trends,
    Sellers,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Trends,
            Page::Trends => Page::Sellers,
            Page::Sellers => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Sellers,
            Page::Trends => Page::Overview,
            Page::Sellers => Page::Trends,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Trends => "Trends",
            Page::Sellers => "Best / Worst Sellers",
        }
    }
}

/// One single-value cursor per filter dimension; `None` allows all
#[derive(Debug, Clone, Default)]
pub struct FilterCursor {
    pub month: Option<usize>,
    pub day: Option<usize>,
    pub hour: Option<usize>,
    pub category: Option<usize>,
    pub size: Option<usize>,
}

fn cycle(cursor: Option<usize>, len: usize) -> Option<usize> {
    match cursor {
        None if len > 0 => Some(0),
        Some(i) if i + 1 < len => Some(i + 1),
        _ => None,
    }
}

pub struct App {
    pub dataset: Arc<Dataset>,
    pub observed: ObservedValues,
    pub cursor: FilterCursor,
    pub selection: FilterSelection,
    pub dashboard: Dashboard,
    pub current_page: Page,
    pub daily_state: TableState,
}

impl App {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let observed = dataset.observed_values();
        let selection = FilterSelection::all();
        let dashboard = dataset.dashboard(&selection);

        let mut daily_state = TableState::default();
        daily_state.select(Some(0));

        Self {
            dataset,
            observed,
            cursor: FilterCursor::default(),
            selection,
            dashboard,
            current_page: Page::Overview,
            daily_state,
        }
    }

    pub fn cycle_filter(&mut self, dimension: Dimension) {
        let len = self.observed.values(dimension).len();
        let slot = match dimension {
            Dimension::MonthName => &mut self.cursor.month,
            Dimension::DayOfWeek => &mut self.cursor.day,
            Dimension::OrderHour => &mut self.cursor.hour,
            Dimension::PizzaCategory => &mut self.cursor.category,
            Dimension::PizzaSize => &mut self.cursor.size,
        };
        *slot = cycle(*slot, len);
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.cursor = FilterCursor::default();
        self.refresh();
    }

    /// Rebuild the selection from the cursors and recompute every view
    fn refresh(&mut self) {
        let observed = &self.observed;
        let pick = |values: &[String], cursor: Option<usize>| {
            cursor.and_then(|i| values.get(i).cloned())
        };

        let mut selection = FilterSelection::all();
        if let Some(month) = pick(&observed.months, self.cursor.month) {
            selection = selection.with_months([month]);
        }
        if let Some(day) = pick(&observed.days, self.cursor.day) {
            selection = selection.with_days([day]);
        }
        if let Some(hour) = self.cursor.hour.and_then(|i| observed.hours.get(i).copied()) {
            selection = selection.with_hours([hour]);
        }
        if let Some(category) = pick(&observed.categories, self.cursor.category) {
            selection = selection.with_categories([category]);
        }
        if let Some(size) = pick(&observed.sizes, self.cursor.size) {
            selection = selection.with_sizes([size]);
        }

        self.dashboard = self.dataset.dashboard(&selection);
        self.selection = selection;
        self.daily_state.select(Some(0));
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next_day(&mut self) {
        let len = self.dashboard.daily_orders.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.daily_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.daily_state.select(Some(i));
    }

    pub fn previous_day(&mut self) {
        let len = self.dashboard.daily_orders.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.daily_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.daily_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('m') => app.cycle_filter(Dimension::MonthName),
                KeyCode::Char('d') => app.cycle_filter(Dimension::DayOfWeek),
                KeyCode::Char('h') => app.cycle_filter(Dimension::OrderHour),
                KeyCode::Char('c') => app.cycle_filter(Dimension::PizzaCategory),
                KeyCode::Char('s') => app.cycle_filter(Dimension::PizzaSize),
                KeyCode::Char('x') => app.clear_filters(),
                KeyCode::Down | KeyCode::Char('j') => app.next_day(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_day(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // KPIs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_kpis(f, chunks[1], &app.dashboard);

    if app.dashboard.is_empty() {
        render_no_data(f, chunks[2]);
    } else {
        match app.current_page {
            Page::Overview => render_overview(f, chunks[2], app),
            Page::Trends => render_trends(f, chunks[2], app),
            Page::Sellers => render_sellers(f, chunks[2], app),
        }
    }

    render_status_bar(f, chunks[3], app);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", title))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Overview, Page::Trends, Page::Sellers];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows: {}", app.dataset.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Pizza Sales Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_kpis(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(" Revenue: ", label),
        Span::styled(
            format!("${:.2}", kpis.total_revenue),
            Style::default().fg(Color::Green),
        ),
        Span::styled("  Orders: ", label),
        Span::raw(kpis.total_orders.to_string()),
        Span::styled("  Avg. Order: ", label),
        Span::raw(format!("${:.2}", kpis.average_order_value)),
        Span::styled("  Pizzas Sold: ", label),
        Span::raw(kpis.total_pizzas_sold.to_string()),
    ]);

    f.render_widget(Paragraph::new(vec![line]).block(bordered("KPIs")), area);
}

fn render_no_data(f: &mut Frame, area: Rect) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  No data matches the selected filters",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Press x to clear filters",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(bordered("No Data")), area);
}

fn share_table<'a>(title: &'a str, view: &View<SalesShare>) -> Table<'a> {
    let header = Row::new(
        ["Group", "Revenue", "%"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray));

    let rows: Vec<Row> = view
        .rows()
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.group.clone()),
                Cell::from(format!("{:.2}", row.total_revenue)),
                Cell::from(format!("{:.2}%", row.pct)).style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(bordered(title))
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    f.render_widget(
        share_table("% of Sales by Category", &app.dashboard.sales_by_category),
        columns[0],
    );
    f.render_widget(
        share_table("% of Sales by Size", &app.dashboard.sales_by_size),
        columns[1],
    );

    let month_rows: Vec<Row> = app
        .dashboard
        .monthly_orders
        .rows()
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.month_name.clone()),
                Cell::from(row.total_orders.to_string()),
            ])
        })
        .collect();
    let months = Table::new(month_rows, [Constraint::Length(12), Constraint::Length(8)])
        .header(Row::new(vec![
            Cell::from("Month").style(header_style()),
            Cell::from("Orders").style(header_style()),
        ]))
        .block(bordered("Monthly Orders"));

    f.render_widget(months, columns[2]);
}

fn render_trends(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let hourly = &app.dashboard.hourly_orders;
    let peak = hourly
        .rows()
        .iter()
        .map(|r| r.total_orders)
        .max()
        .unwrap_or(0)
        .max(1);
    let width = columns[0].width.saturating_sub(16) as usize;

    let hour_rows: Vec<Row> = hourly
        .rows()
        .iter()
        .map(|row| {
            let bar = "█".repeat(row.total_orders * width / peak);
            Row::new(vec![
                Cell::from(format!("{:02}:00", row.order_hour)),
                Cell::from(row.total_orders.to_string()),
                Cell::from(bar).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();
    let hours = Table::new(
        hour_rows,
        [
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Min(0),
        ],
    )
    .header(Row::new(vec![
        Cell::from("Hour").style(header_style()),
        Cell::from("Orders").style(header_style()),
        Cell::from(""),
    ]))
    .block(bordered("Hourly Orders"));
    f.render_widget(hours, columns[0]);

    let day_rows: Vec<Row> = app
        .dashboard
        .daily_orders
        .rows()
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.order_date.format("%Y-%m-%d %a").to_string()),
                Cell::from(row.total_orders.to_string()),
            ])
        })
        .collect();
    let days = Table::new(day_rows, [Constraint::Length(16), Constraint::Length(8)])
        .header(Row::new(vec![
            Cell::from("Date").style(header_style()),
            Cell::from("Orders").style(header_style()),
        ]))
        .block(bordered("Daily Orders"))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");
    f.render_stateful_widget(days, columns[1], &mut app.daily_state);
}

fn seller_table<'a>(title: &'a str, view: &View<SellerRow>) -> Table<'a> {
    let rows: Vec<Row> = view
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(format!("{}.", i + 1)),
                Cell::from(truncate(&row.pizza_name, 34)),
                Cell::from(format!("{:.2}", row.total_revenue)),
                Cell::from(row.quantity.to_string()),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(35),
            Constraint::Length(11),
            Constraint::Length(6),
        ],
    )
    .header(Row::new(
        ["#", "Pizza", "Revenue", "Qty"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    ))
    .block(bordered(title))
}

fn render_sellers(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let dash = &app.dashboard;
    f.render_widget(seller_table("Top by Revenue", &dash.top_by_revenue), top[0]);
    f.render_widget(seller_table("Top by Quantity", &dash.top_by_quantity), top[1]);
    f.render_widget(
        seller_table("Bottom by Revenue", &dash.bottom_by_revenue),
        bottom[0],
    );
    f.render_widget(
        seller_table("Bottom by Quantity", &dash.bottom_by_quantity),
        bottom[1],
    );
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let status_spans = vec![
        Span::styled(
            format!(" Filter: {} ", app.selection.describe()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("| "),
        Span::styled("m/d/h/c/s", key),
        Span::raw(" month/day/hour/category/size | "),
        Span::styled("x", key),
        Span::raw(" clear | "),
        Span::styled("Tab", key),
        Span::raw(" Page | "),
        Span::styled("↑/↓", key),
        Span::raw(" Days | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
