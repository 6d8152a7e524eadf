use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::cli::input::Form;
use crate::cli::state::{category_name, App, Screen};
use crate::cli::util::{fmt_money, iso};

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    // top tabs | main content | status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(size);

    let user = app
        .username
        .as_ref()
        .map(|u| format!("Expense Tracker - {u}"))
        .unwrap_or_else(|| "Expense Tracker".into());

    if app.screen.needs_auth() {
        let titles = Screen::TABS
            .iter()
            .enumerate()
            .map(|(i, s)| Line::from(Span::raw(format!("{} {}", i + 1, s.title()))))
            .collect::<Vec<_>>();
        let selected = Screen::TABS.iter().position(|&s| s == app.screen).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(user))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD));
        f.render_widget(tabs, root[0]);
    } else {
        let header = Paragraph::new(app.screen.title())
            .block(Block::default().borders(Borders::ALL).title(user));
        f.render_widget(header, root[0]);
    }

    match app.screen {
        Screen::Login => draw_form(f, center_rect(root[1], 50, 9), &app.login.form),
        Screen::Register => draw_form(f, center_rect(root[1], 50, 11), &app.register.form),
        Screen::Spends => draw_spends(f, root[1], app),
        Screen::Tasks => draw_tasks(f, root[1], app),
        Screen::Categories => draw_categories(f, root[1], app),
        Screen::Profile => draw_profile(f, root[1], app),
        Screen::Help => draw_help(f, root[1]),
    }

    let modal = match app.screen {
        Screen::Spends => app.spends.form.as_ref(),
        Screen::Tasks => app.tasks.form.as_ref(),
        Screen::Categories => app.categories.form.as_ref(),
        Screen::Profile => app.profile.form.as_ref(),
        _ => None,
    };
    if let Some(form) = modal {
        let area = center_rect(root[1], 60, form.fields.len() as u16 + 6);
        f.render_widget(Clear, area);
        draw_form(f, area, form);
    }

    f.render_widget(Paragraph::new(app.status.as_str()), root[2]);
}

fn draw_form(f: &mut Frame, area: Rect, form: &Form) {
    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let marker = if i == form.focus { "> " } else { "  " };
            let hint = if field.choice && i == form.focus { "  (←/→)" } else { "" };
            let text = format!("{marker}{:<12}: {}{hint}", field.label, field.edit.rendered());
            if i == form.focus {
                Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
            } else {
                Line::from(text)
            }
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from("Tab: next field | Enter: submit | Esc: cancel"));
    if let Some(err) = &form.error {
        lines.push(Line::from(format!("Error: {err}")));
    }

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(form.title))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

// Spends Page

fn draw_spends(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    let header = Row::new(vec!["Date", "Title", "Category", "Amount"]).height(1);
    let body: Vec<Row> = app
        .spends
        .visible()
        .into_iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(iso(&s.date)),
                Cell::from(s.title.clone()),
                Cell::from(category_name(&app.categories.list, s.category)),
                Cell::from(fmt_money(&s.amount)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Percentage(45),
        Constraint::Length(16),
        Constraint::Length(12),
    ];

    let filter = match app.spends.filter {
        Some(_) => format!(" [{}]", category_name(&app.categories.list, app.spends.filter)),
        None => String::new(),
    };
    let title = format!("Spends{filter}  (n=new, e=edit, x=delete, f=filter, r=refresh)");

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, cols[0], &mut app.spends.tsel);

    let mut lines = vec![
        format!("Total: {}", fmt_money(&app.spends.total())),
        String::new(),
        "By category:".to_string(),
    ];
    for (name, sum) in app.spends.totals_by_category(&app.categories.list) {
        lines.push(format!("  {name:<16} {:>10}", fmt_money(&sum)));
    }
    if let Some(note) = app.spends.selected().and_then(|s| s.note.clone()) {
        lines.push(String::new());
        lines.push(format!("Note: {note}"));
    }
    let summary = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .wrap(Wrap { trim: false });
    f.render_widget(summary, cols[1]);
}

// Tasks Page

fn draw_tasks(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec!["", "Title", "Due", "Description"]).height(1);
    let body: Vec<Row> = app
        .tasks
        .list
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(if t.completed { "[x]" } else { "[ ]" }),
                Cell::from(t.title.clone()),
                Cell::from(t.due_date.map(|d| iso(&d)).unwrap_or_else(|| "-".into())),
                Cell::from(t.description.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(35),
        Constraint::Length(12),
        Constraint::Percentage(50),
    ];

    let (open, done) = app.tasks.counts();
    let title = format!("Tasks  {open} open / {done} done  (space=toggle, n=new, e=edit, x=delete)");

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, area, &mut app.tasks.tsel);
}

// Categories Page

fn draw_categories(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .categories
        .list
        .iter()
        .map(|c| ListItem::new(Line::from(c.name.clone())))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Categories  (n=new, x=delete, r=refresh)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut app.categories.sel);
}

// Profile Page

fn draw_profile(f: &mut Frame, area: Rect, app: &mut App) {
    let text = match &app.profile.profile {
        Some(p) => format!(
            "Username  : {}\nName      : {}\nEmail     : {}\n\ne=edit, r=refresh, L=log out",
            p.username,
            p.display_name(),
            if p.email.is_empty() { "-" } else { p.email.as_str() },
        ),
        None => "Profile not loaded (r to retry)".to_string(),
    };
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = [
        "Global Keys:",
        "  q        : Quit",
        "  Tab/1-4  : Switch page",
        "  ?        : This help",
        "  L        : Log out",
        "",
        "Spends:",
        "  Up/Down  : Navigate",
        "  n / e    : New / edit spend",
        "  x/Del    : Delete selected spend",
        "  f        : Cycle category filter",
        "  r        : Refresh",
        "",
        "Tasks:",
        "  space/t  : Toggle done",
        "  n / e    : New / edit task",
        "  x/Del    : Delete selected task",
        "",
        "Categories:",
        "  n        : New category",
        "  x/Del    : Delete selected category",
        "",
        "Forms:",
        "  Tab      : Next field",
        "  ←/→      : Pick category (on Category field)",
        "  Enter    : Submit",
        "  Esc      : Cancel",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect { x, y, width: w.min(rect.width), height: h.min(rect.height) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::api::ApiClient;
    use crate::config::normalize_base_url;
    use crate::session::{MemorySessionStore, Session};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn login_screen_renders_masked_password() {
        let api = ApiClient::new(
            normalize_base_url("http://127.0.0.1:9/api/").unwrap(),
            Duration::from_secs(1),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap();
        let mut app = App::new(api);
        app.login.form.set(0, "alice");
        app.login.form.set(1, "hunter22");

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("alice"));
        assert!(text.contains("********"));
        assert!(!text.contains("hunter22"));
    }

    #[test]
    fn header_shows_cached_username_until_logout() {
        let store = Arc::new(MemorySessionStore::with_session(Session::new(
            "tok",
            Some("alice".into()),
        )));
        let api = ApiClient::new(
            normalize_base_url("http://127.0.0.1:9/api/").unwrap(),
            Duration::from_secs(1),
            store,
        )
        .unwrap();
        let mut app = App::new(api);
        assert_eq!(app.username.as_deref(), Some("alice"));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("Expense Tracker - alice"));

        app.logout();
        assert_eq!(app.username, None);
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        assert!(!buffer_text(&terminal).contains("Expense Tracker - alice"));
    }
}
