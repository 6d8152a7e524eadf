// src/cli/state.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::{ListState, TableState};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::{ApiClient, Category, Profile, Spend, Task};
use crate::cli::input::{Form, FormAction};
use crate::cli::util::{cycle_optional, iso, today, wrap_index};
use crate::error::ApiError;
use crate::validate;

pub const SESSION_EXPIRED: &str = "Session expired, please log in again";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Spends,
    Tasks,
    Categories,
    Profile,
    Help,
}

impl Screen {
    pub const TABS: [Screen; 5] = [
        Screen::Spends,
        Screen::Tasks,
        Screen::Categories,
        Screen::Profile,
        Screen::Help,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Spends => "Spends",
            Self::Tasks => "Tasks",
            Self::Categories => "Categories",
            Self::Profile => "Profile",
            Self::Help => "Help",
        }
    }

    pub fn needs_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }
}

// ============= Forms =============

pub mod fields {
    pub const LOGIN_USERNAME: usize = 0;
    pub const LOGIN_PASSWORD: usize = 1;

    pub const REG_USERNAME: usize = 0;
    pub const REG_EMAIL: usize = 1;
    pub const REG_PASSWORD: usize = 2;
    pub const REG_CONFIRM: usize = 3;

    pub const SPEND_TITLE: usize = 0;
    pub const SPEND_AMOUNT: usize = 1;
    pub const SPEND_DATE: usize = 2;
    pub const SPEND_CATEGORY: usize = 3;
    pub const SPEND_NOTE: usize = 4;

    pub const TASK_TITLE: usize = 0;
    pub const TASK_DESCRIPTION: usize = 1;
    pub const TASK_DUE: usize = 2;

    pub const CATEGORY_NAME: usize = 0;

    pub const PROFILE_EMAIL: usize = 0;
    pub const PROFILE_FIRST: usize = 1;
    pub const PROFILE_LAST: usize = 2;
}
use fields::*;

fn login_form() -> Form {
    Form::new("Log in", &["Username", "Password"]).masked(LOGIN_PASSWORD)
}

fn register_form() -> Form {
    Form::new("Create account", &["Username", "Email", "Password", "Confirm"])
        .masked(REG_PASSWORD)
        .masked(REG_CONFIRM)
}

fn spend_form(title: &'static str) -> Form {
    Form::new(title, &["Title", "Amount", "Date", "Category", "Note"]).choice(SPEND_CATEGORY)
}

fn task_form(title: &'static str) -> Form {
    Form::new(title, &["Title", "Description", "Due date"])
}

// ============= Pages =============

#[derive(Debug, Clone)]
pub struct LoginPage {
    pub form: Form,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self { form: login_form() }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterPage {
    pub form: Form,
}

impl Default for RegisterPage {
    fn default() -> Self {
        Self { form: register_form() }
    }
}

#[derive(Debug, Default)]
pub struct SpendsPage {
    pub list: Vec<Spend>,
    pub tsel: TableState,
    /// Show only this category.
    pub filter: Option<i64>,
    pub form: Option<Form>,
    /// Category picked in the open form.
    pub form_category: Option<i64>,
}

impl SpendsPage {
    pub fn visible(&self) -> Vec<&Spend> {
        self.list
            .iter()
            .filter(|s| self.filter.map_or(true, |c| s.category == Some(c)))
            .collect()
    }

    pub fn total(&self) -> Decimal {
        self.visible().iter().map(|s| s.amount).sum()
    }

    /// Sum per category name over every loaded spend, largest first.
    pub fn totals_by_category(&self, categories: &[Category]) -> Vec<(String, Decimal)> {
        let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();
        for s in &self.list {
            *sums.entry(category_name(categories, s.category)).or_default() += s.amount;
        }
        let mut out: Vec<_> = sums.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    fn move_sel(&mut self, delta: isize) {
        let next = wrap_index(self.tsel.selected(), self.visible().len(), delta);
        self.tsel.select(next);
    }

    pub fn selected(&self) -> Option<&Spend> {
        let idx = self.tsel.selected()?;
        self.visible().get(idx).copied()
    }

    fn clamp(&mut self) {
        let len = self.visible().len();
        match (len, self.tsel.selected()) {
            (0, _) => self.tsel.select(None),
            (n, Some(i)) if i >= n => self.tsel.select(Some(n - 1)),
            (_, None) => self.tsel.select(Some(0)),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct TasksPage {
    pub list: Vec<Task>,
    pub tsel: TableState,
    pub form: Option<Form>,
}

impl TasksPage {
    pub fn counts(&self) -> (usize, usize) {
        let done = self.list.iter().filter(|t| t.completed).count();
        (self.list.len() - done, done)
    }

    fn move_sel(&mut self, delta: isize) {
        let next = wrap_index(self.tsel.selected(), self.list.len(), delta);
        self.tsel.select(next);
    }

    pub fn selected(&self) -> Option<&Task> {
        self.list.get(self.tsel.selected()?)
    }

    fn clamp(&mut self) {
        let len = self.list.len();
        match (len, self.tsel.selected()) {
            (0, _) => self.tsel.select(None),
            (n, Some(i)) if i >= n => self.tsel.select(Some(n - 1)),
            (_, None) => self.tsel.select(Some(0)),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct CategoriesPage {
    pub list: Vec<Category>,
    pub sel: ListState,
    pub form: Option<Form>,
}

impl CategoriesPage {
    fn move_sel(&mut self, delta: isize) {
        let next = wrap_index(self.sel.selected(), self.list.len(), delta);
        self.sel.select(next);
    }

    pub fn selected(&self) -> Option<&Category> {
        self.list.get(self.sel.selected()?)
    }

    fn clamp(&mut self) {
        let len = self.list.len();
        match (len, self.sel.selected()) {
            (0, _) => self.sel.select(None),
            (n, Some(i)) if i >= n => self.sel.select(Some(n - 1)),
            (_, None) => self.sel.select(Some(0)),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfilePage {
    pub profile: Option<Profile>,
    pub form: Option<Form>,
}

pub fn category_name(categories: &[Category], id: Option<i64>) -> String {
    match id {
        None => "Uncategorized".into(),
        Some(id) => categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{id}")),
    }
}

// ============= App =============

pub struct App {
    pub api: ApiClient,
    pub screen: Screen,
    pub status: String,
    pub quit: bool,
    /// Who the stored session belongs to, for the header.
    pub username: Option<String>,
    pub today: NaiveDate,
    pub login: LoginPage,
    pub register: RegisterPage,
    pub spends: SpendsPage,
    pub tasks: TasksPage,
    pub categories: CategoriesPage,
    pub profile: ProfilePage,
}

impl App {
    pub fn new(api: ApiClient) -> Self {
        let session = api.session();
        let authed = session.is_some();
        let username = session.and_then(|s| s.username);
        let mut login = LoginPage::default();
        if let Some(name) = &username {
            login.form.set(LOGIN_USERNAME, name.clone());
        }

        Self {
            api,
            screen: if authed { Screen::Spends } else { Screen::Login },
            status: if authed {
                "Tab: switch page | ? help | q quit".into()
            } else {
                "Enter: log in | F2: register | Esc: quit".into()
            },
            quit: false,
            username,
            today: today(),
            login,
            register: RegisterPage::default(),
            spends: SpendsPage::default(),
            tasks: TasksPage::default(),
            categories: CategoriesPage::default(),
            profile: ProfilePage::default(),
        }
    }

    /// Load everything a logged-in session shows.
    pub async fn start(&mut self) {
        if self.screen.needs_auth() {
            self.refresh_all().await;
        }
    }

    /// The alert: a 401 sends the user back to the login page, anything else
    /// lands in the status bar.
    pub fn report(&mut self, err: ApiError) {
        if err.is_unauthorized() {
            self.expire_session();
        } else {
            warn!(error = %err, "request failed");
            self.status = format!("Error: {err}");
        }
    }

    /// A failed save: the message goes to the open form and the status bar.
    fn report_form_error(&mut self, err: ApiError) {
        if !err.is_unauthorized() {
            let message = err.to_string();
            if let Some(form) = self.active_form_mut() {
                form.error = Some(message);
            }
        }
        self.report(err);
    }

    fn expire_session(&mut self) {
        info!("session expired, returning to login");
        let username = self.login.form.value(LOGIN_USERNAME).to_string();
        self.username = None;
        self.reset_pages();
        self.login.form.set(LOGIN_USERNAME, username);
        self.screen = Screen::Login;
        self.status = SESSION_EXPIRED.into();
    }

    fn reset_pages(&mut self) {
        self.login = LoginPage::default();
        self.register = RegisterPage::default();
        self.spends = SpendsPage::default();
        self.tasks = TasksPage::default();
        self.categories = CategoriesPage::default();
        self.profile = ProfilePage::default();
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.api.logout() {
            self.status = format!("Error: {e}");
            return;
        }
        self.username = None;
        self.reset_pages();
        self.screen = Screen::Login;
        self.status = "Logged out".into();
    }

    // ============= Loading =============

    pub async fn refresh_all(&mut self) {
        self.refresh_categories().await;
        if self.screen == Screen::Login {
            return;
        }
        self.refresh_spends().await;
        if self.screen == Screen::Login {
            return;
        }
        self.refresh_tasks().await;
    }

    pub async fn refresh_spends(&mut self) {
        match self.api.list_spends().await {
            Ok(mut list) => {
                list.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
                self.spends.list = list;
                self.spends.clamp();
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn refresh_tasks(&mut self) {
        match self.api.list_tasks().await {
            Ok(list) => {
                self.tasks.list = list;
                self.tasks.clamp();
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn refresh_categories(&mut self) {
        match self.api.list_categories().await {
            Ok(mut list) => {
                list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                self.categories.list = list;
                self.categories.clamp();
                if let Some(f) = self.spends.filter {
                    if !self.categories.list.iter().any(|c| c.id == f) {
                        self.spends.filter = None;
                    }
                }
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn refresh_profile(&mut self) {
        match self.api.get_profile().await {
            Ok(p) => self.profile.profile = Some(p),
            Err(e) => self.report(e),
        }
    }

    fn open_screen(&mut self, screen: Screen) -> bool {
        let changed = self.screen != screen;
        self.screen = screen;
        changed
    }

    async fn switch_tab(&mut self, delta: isize) {
        let cur = Screen::TABS.iter().position(|&s| s == self.screen);
        let next = wrap_index(cur, Screen::TABS.len(), delta).unwrap_or(0);
        self.goto(Screen::TABS[next]).await;
    }

    async fn goto(&mut self, screen: Screen) {
        if self.open_screen(screen) && screen == Screen::Profile && self.profile.profile.is_none() {
            self.refresh_profile().await;
        }
    }

    // ============= Keys =============

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }

        match self.screen {
            Screen::Login => return self.handle_login_key(k).await,
            Screen::Register => return self.handle_register_key(k).await,
            _ => {}
        }

        if self.form_open() {
            self.handle_form_key(k).await;
            return Ok(());
        }

        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return Ok(());
            }
            KeyCode::Tab => {
                self.switch_tab(1).await;
                return Ok(());
            }
            KeyCode::BackTab => {
                self.switch_tab(-1).await;
                return Ok(());
            }
            KeyCode::Char('?') => {
                self.screen = Screen::Help;
                return Ok(());
            }
            KeyCode::Char('L') => {
                self.logout();
                return Ok(());
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.goto(Screen::TABS[idx]).await;
                return Ok(());
            }
            _ => {}
        }

        match self.screen {
            Screen::Spends => self.handle_spends_key(k).await,
            Screen::Tasks => self.handle_tasks_key(k).await,
            Screen::Categories => self.handle_categories_key(k).await,
            Screen::Profile => self.handle_profile_key(k).await,
            Screen::Help => {
                if matches!(k.code, KeyCode::Esc | KeyCode::Char('b')) {
                    self.screen = Screen::Spends;
                }
            }
            Screen::Login | Screen::Register => {}
        }
        Ok(())
    }

    pub fn form_open(&self) -> bool {
        match self.screen {
            Screen::Spends => self.spends.form.is_some(),
            Screen::Tasks => self.tasks.form.is_some(),
            Screen::Categories => self.categories.form.is_some(),
            Screen::Profile => self.profile.form.is_some(),
            _ => false,
        }
    }

    fn active_form_mut(&mut self) -> Option<&mut Form> {
        match self.screen {
            Screen::Login => Some(&mut self.login.form),
            Screen::Register => Some(&mut self.register.form),
            Screen::Spends => self.spends.form.as_mut(),
            Screen::Tasks => self.tasks.form.as_mut(),
            Screen::Categories => self.categories.form.as_mut(),
            Screen::Profile => self.profile.form.as_mut(),
            Screen::Help => None,
        }
    }

    async fn handle_form_key(&mut self, k: KeyEvent) {
        let Some(form) = self.active_form_mut() else { return };

        match form.handle_key(k) {
            FormAction::None => {}
            FormAction::Cancel => self.close_form(),
            FormAction::Cycle(delta) => self.cycle_form_category(delta),
            FormAction::Submit => match self.screen {
                Screen::Spends => self.submit_spend().await,
                Screen::Tasks => self.submit_task().await,
                Screen::Categories => self.submit_category().await,
                Screen::Profile => self.submit_profile().await,
                _ => {}
            },
        }
    }

    fn close_form(&mut self) {
        match self.screen {
            Screen::Spends => {
                self.spends.form = None;
                self.spends.form_category = None;
            }
            Screen::Tasks => self.tasks.form = None,
            Screen::Categories => self.categories.form = None,
            Screen::Profile => self.profile.form = None,
            _ => {}
        }
    }

    // ============= Auth pages =============

    async fn handle_login_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        match k.code {
            KeyCode::F(2) => {
                self.register = RegisterPage::default();
                self.screen = Screen::Register;
                self.status = "Enter: create account | Esc: back to login".into();
                return Ok(());
            }
            KeyCode::Esc => {
                self.quit = true;
                return Ok(());
            }
            _ => {}
        }

        if self.login.form.handle_key(k) == FormAction::Submit {
            self.submit_login().await;
        }
        Ok(())
    }

    pub async fn submit_login(&mut self) {
        let form = &self.login.form;
        let creds = match validate::credentials(form.value(LOGIN_USERNAME), form.value(LOGIN_PASSWORD)) {
            Ok(c) => c,
            Err(e) => {
                self.login.form.focus_field(e.field);
                self.login.form.error = Some(e.to_string());
                return;
            }
        };

        match self.api.login(&creds).await {
            Ok(session) => {
                self.login.form = login_form();
                self.login.form.set(LOGIN_USERNAME, creds.username.clone());
                self.screen = Screen::Spends;
                let name = session.username.unwrap_or(creds.username);
                self.status = format!("Logged in as {name}");
                self.username = Some(name);
                self.refresh_all().await;
            }
            Err(e) => {
                self.login.form.set(LOGIN_PASSWORD, "");
                self.login.form.focus = LOGIN_PASSWORD;
                self.login.form.error = Some(match &e {
                    ApiError::Validation { .. } | ApiError::Unauthorized { .. } => {
                        "Invalid username or password".into()
                    }
                    other => other.to_string(),
                });
            }
        }
    }

    async fn handle_register_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        match self.register.form.handle_key(k) {
            FormAction::Cancel => {
                self.screen = Screen::Login;
                self.status = "Enter: log in | F2: register | Esc: quit".into();
            }
            FormAction::Submit => self.submit_register().await,
            _ => {}
        }
        Ok(())
    }

    pub async fn submit_register(&mut self) {
        let f = &self.register.form;
        let reg = match validate::registration(
            f.value(REG_USERNAME),
            f.value(REG_EMAIL),
            f.value(REG_PASSWORD),
            f.value(REG_CONFIRM),
        ) {
            Ok(r) => r,
            Err(e) => {
                self.register.form.focus_field(e.field);
                self.register.form.error = Some(e.to_string());
                return;
            }
        };

        match self.api.register(&reg).await {
            Ok(profile) => {
                self.register = RegisterPage::default();
                self.login.form = login_form();
                self.login.form.set(LOGIN_USERNAME, profile.username);
                self.login.form.focus = LOGIN_PASSWORD;
                self.screen = Screen::Login;
                self.status = "Account created, please log in".into();
            }
            Err(e) => self.report_form_error(e),
        }
    }

    // ============= Spends =============

    async fn handle_spends_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Up => self.spends.move_sel(-1),
            KeyCode::Down => self.spends.move_sel(1),
            KeyCode::Char('n') => {
                self.spends.form = Some(spend_form("New spend").with_value(SPEND_DATE, iso(&self.today)));
                self.spends.form_category = self.spends.filter;
                self.sync_category_field();
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(s) = self.spends.selected().cloned() {
                    self.spends.form = Some(
                        spend_form("Edit spend")
                            .editing(s.id)
                            .with_value(SPEND_TITLE, s.title)
                            .with_value(SPEND_AMOUNT, s.amount.to_string())
                            .with_value(SPEND_DATE, iso(&s.date))
                            .with_value(SPEND_NOTE, s.note.unwrap_or_default()),
                    );
                    self.spends.form_category = s.category;
                    self.sync_category_field();
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => self.delete_spend().await,
            KeyCode::Char('f') => {
                let ids: Vec<i64> = self.categories.list.iter().map(|c| c.id).collect();
                let cur = self.spends.filter.and_then(|f| ids.iter().position(|&id| id == f));
                self.spends.filter = cycle_optional(cur, ids.len(), 1).map(|i| ids[i]);
                self.spends.tsel.select(None);
                self.spends.clamp();
            }
            KeyCode::Char('r') => {
                self.refresh_categories().await;
                self.refresh_spends().await;
            }
            _ => {}
        }
    }

    fn cycle_form_category(&mut self, delta: i32) {
        if self.screen != Screen::Spends {
            return;
        }
        let ids: Vec<i64> = self.categories.list.iter().map(|c| c.id).collect();
        let cur = self.spends.form_category.and_then(|f| ids.iter().position(|&id| id == f));
        self.spends.form_category = cycle_optional(cur, ids.len(), delta).map(|i| ids[i]);
        self.sync_category_field();
    }

    fn sync_category_field(&mut self) {
        let name = category_name(&self.categories.list, self.spends.form_category);
        if let Some(form) = self.spends.form.as_mut() {
            form.set(SPEND_CATEGORY, name);
        }
    }

    pub async fn submit_spend(&mut self) {
        let Some(form) = self.spends.form.as_ref() else { return };
        let draft = match validate::spend(
            form.value(SPEND_TITLE),
            form.value(SPEND_AMOUNT),
            form.value(SPEND_DATE),
            self.spends.form_category,
            form.value(SPEND_NOTE),
            self.today,
        ) {
            Ok(d) => d,
            Err(e) => {
                if let Some(form) = self.spends.form.as_mut() {
                    form.focus_field(e.field);
                    form.error = Some(e.to_string());
                }
                return;
            }
        };

        let res = match form.editing {
            Some(id) => self.api.update_spend(id, &draft).await,
            None => self.api.create_spend(&draft).await,
        };
        match res {
            Ok(saved) => {
                self.status = format!("Saved \"{}\"", saved.title);
                self.spends.form = None;
                self.spends.form_category = None;
                self.refresh_spends().await;
            }
            Err(e) => self.report_form_error(e),
        }
    }

    async fn delete_spend(&mut self) {
        let Some((id, title)) = self.spends.selected().map(|s| (s.id, s.title.clone())) else {
            return;
        };
        match self.api.delete_spend(id).await {
            Ok(()) => {
                self.spends.list.retain(|s| s.id != id);
                self.spends.clamp();
                self.status = format!("Deleted \"{title}\"");
            }
            Err(e) => self.report(e),
        }
    }

    // ============= Tasks =============

    async fn handle_tasks_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Up => self.tasks.move_sel(-1),
            KeyCode::Down => self.tasks.move_sel(1),
            KeyCode::Char('n') => self.tasks.form = Some(task_form("New task")),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(t) = self.tasks.selected().cloned() {
                    self.tasks.form = Some(
                        task_form("Edit task")
                            .editing(t.id)
                            .with_value(TASK_TITLE, t.title)
                            .with_value(TASK_DESCRIPTION, t.description.unwrap_or_default())
                            .with_value(TASK_DUE, t.due_date.map(|d| iso(&d)).unwrap_or_default()),
                    );
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('t') => self.toggle_task().await,
            KeyCode::Char('x') | KeyCode::Delete => self.delete_task().await,
            KeyCode::Char('r') => self.refresh_tasks().await,
            _ => {}
        }
    }

    /// Flip `completed` locally, then tell the backend. A failure puts the
    /// old value back.
    pub async fn toggle_task(&mut self) {
        let Some(idx) = self.tasks.tsel.selected() else { return };
        let Some(task) = self.tasks.list.get_mut(idx) else { return };
        let id = task.id;
        let previous = task.completed;
        task.completed = !previous;

        match self.api.set_task_completed(id, !previous).await {
            Ok(server) => {
                if let Some(t) = self.tasks.list.iter_mut().find(|t| t.id == id) {
                    *t = server;
                }
            }
            Err(e) => {
                if let Some(t) = self.tasks.list.iter_mut().find(|t| t.id == id) {
                    t.completed = previous;
                }
                self.report(e);
            }
        }
    }

    pub async fn submit_task(&mut self) {
        let Some(form) = self.tasks.form.as_ref() else { return };
        let editing = form.editing;
        let completed = editing
            .and_then(|id| self.tasks.list.iter().find(|t| t.id == id))
            .map(|t| t.completed)
            .unwrap_or(false);
        let draft = match validate::task(
            form.value(TASK_TITLE),
            form.value(TASK_DESCRIPTION),
            form.value(TASK_DUE),
            completed,
        ) {
            Ok(d) => d,
            Err(e) => {
                if let Some(form) = self.tasks.form.as_mut() {
                    form.focus_field(e.field);
                    form.error = Some(e.to_string());
                }
                return;
            }
        };

        let res = match editing {
            Some(id) => self.api.update_task(id, &draft).await,
            None => self.api.create_task(&draft).await,
        };
        match res {
            Ok(saved) => {
                self.status = format!("Saved \"{}\"", saved.title);
                self.tasks.form = None;
                match self.tasks.list.iter_mut().find(|t| t.id == saved.id) {
                    Some(t) => *t = saved,
                    None => self.tasks.list.push(saved),
                }
                self.tasks.clamp();
            }
            Err(e) => self.report_form_error(e),
        }
    }

    async fn delete_task(&mut self) {
        let Some(id) = self.tasks.selected().map(|t| t.id) else { return };
        match self.api.delete_task(id).await {
            Ok(()) => {
                self.tasks.list.retain(|t| t.id != id);
                self.tasks.clamp();
                self.status = "Task deleted".into();
            }
            Err(e) => self.report(e),
        }
    }

    // ============= Categories =============

    async fn handle_categories_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Up => self.categories.move_sel(-1),
            KeyCode::Down => self.categories.move_sel(1),
            KeyCode::Char('n') => self.categories.form = Some(Form::new("New category", &["Name"])),
            KeyCode::Char('x') | KeyCode::Delete => self.delete_category().await,
            KeyCode::Char('r') => self.refresh_categories().await,
            _ => {}
        }
    }

    pub async fn submit_category(&mut self) {
        let Some(form) = self.categories.form.as_ref() else { return };
        let draft = match validate::category(form.value(CATEGORY_NAME), &self.categories.list) {
            Ok(d) => d,
            Err(e) => {
                if let Some(form) = self.categories.form.as_mut() {
                    form.error = Some(e.to_string());
                }
                return;
            }
        };

        match self.api.create_category(&draft).await {
            Ok(c) => {
                self.status = format!("Added category \"{}\"", c.name);
                self.categories.form = None;
                self.refresh_categories().await;
            }
            Err(e) => self.report_form_error(e),
        }
    }

    async fn delete_category(&mut self) {
        let Some((id, name)) = self.categories.selected().map(|c| (c.id, c.name.clone())) else {
            return;
        };
        match self.api.delete_category(id).await {
            Ok(()) => {
                self.categories.list.retain(|c| c.id != id);
                self.categories.clamp();
                if self.spends.filter == Some(id) {
                    self.spends.filter = None;
                }
                self.status = format!("Deleted category \"{name}\"");
            }
            Err(e) => self.report(e),
        }
    }

    // ============= Profile =============

    async fn handle_profile_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(p) = self.profile.profile.clone() {
                    self.profile.form = Some(
                        Form::new("Edit profile", &["Email", "First name", "Last name"])
                            .with_value(PROFILE_EMAIL, p.email)
                            .with_value(PROFILE_FIRST, p.first_name)
                            .with_value(PROFILE_LAST, p.last_name),
                    );
                }
            }
            KeyCode::Char('r') => self.refresh_profile().await,
            _ => {}
        }
    }

    pub async fn submit_profile(&mut self) {
        let Some(form) = self.profile.form.as_ref() else { return };
        let update = match validate::profile(
            form.value(PROFILE_EMAIL),
            form.value(PROFILE_FIRST),
            form.value(PROFILE_LAST),
        ) {
            Ok(u) => u,
            Err(e) => {
                if let Some(form) = self.profile.form.as_mut() {
                    form.focus_field(e.field);
                    form.error = Some(e.to_string());
                }
                return;
            }
        };

        match self.api.update_profile(&update).await {
            Ok(p) => {
                self.profile.profile = Some(p);
                self.profile.form = None;
                self.status = "Profile updated".into();
            }
            Err(e) => self.report_form_error(e),
        }
    }
}
