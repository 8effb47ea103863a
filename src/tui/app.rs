//! Application State
//!
//! Contains the main application state and logic for the TUI.

use crate::config::Config;
use crate::models::{AppState, APP_DESCRIPTION, EXAMPLE_QUESTIONS};
use crate::rag::{format_chat_reply, validate_query};
use crate::tui::event::AppAction;
use crate::types::LLMProvider;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info};
use tui_textarea::TextArea;

const INPUT_PLACEHOLDER: &str = "Ask about consumer complaints... (Tab for examples)";

/// Question answering stage
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineStage {
    /// Idle, waiting for input
    #[default]
    Idle,
    /// Opening the vector index and providers (first question only)
    Loading,
    /// Searching the complaint index
    Retrieving,
    /// Waiting for the language model
    Generating,
    Complete,
    Error(String),
}

impl PipelineStage {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::Retrieving | Self::Generating)
    }
}

/// A chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Current view/screen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    Chat,
    Help,
}

/// Events from the background question task
#[derive(Debug)]
pub enum AppEvent {
    StageChanged(PipelineStage),
    /// Number of complaint chunks retrieved for the current question
    SourcesFound(usize),
    ResponseComplete(String),
    Error(String),
}

/// Whether a backing service is usable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApiStatus {
    Ready,
    NotConfigured,
}

/// Main application state
pub struct App {
    pub config: Config,
    state: AppState,

    // UI State
    pub view: View,
    pub should_quit: bool,

    // Chat State
    pub messages: Vec<ChatMessage>,
    pub input: TextArea<'static>,
    pub scroll_offset: u16,
    pub max_scroll: u16,
    follow_output: bool,
    example_index: Option<usize>,

    // Question State
    pub pipeline_stage: PipelineStage,
    pub current_question: Option<String>,
    pub sources_found: Option<usize>,
    pub llm_status: ApiStatus,
    pub index_status: ApiStatus,

    // Async communication
    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self::with_state(AppState::new(config))
    }

    /// Create an application around existing shared state
    pub fn with_state(state: AppState) -> Self {
        let config = state.config.clone();
        let (tx, rx) = mpsc::channel(100);

        let llm_status = if config.llm.api_key().is_empty()
            && config.llm.provider != LLMProvider::OpenAICompatible
        {
            ApiStatus::NotConfigured
        } else {
            ApiStatus::Ready
        };
        let index_status = if state.chain_loaded()
            || config.data.vector_db_dir.join("manifest.json").exists()
        {
            ApiStatus::Ready
        } else {
            ApiStatus::NotConfigured
        };

        let examples = EXAMPLE_QUESTIONS
            .iter()
            .map(|q| format!("  • {}", q))
            .collect::<Vec<_>>()
            .join("\n");
        let mut messages = vec![ChatMessage::new(
            MessageRole::System,
            format!(
                "{}\n\nTry one of these, or press Tab to cycle through them:\n{}",
                APP_DESCRIPTION, examples
            ),
        )];
        if index_status == ApiStatus::NotConfigured {
            messages.push(ChatMessage::new(
                MessageRole::System,
                format!(
                    "No vector index found at {}. Run `complaint-rag index` first.",
                    config.data.vector_db_dir.display()
                ),
            ));
        }

        Self {
            config,
            state,
            view: View::Chat,
            should_quit: false,
            messages,
            input: new_input(),
            scroll_offset: 0,
            max_scroll: 0,
            follow_output: true,
            example_index: None,
            pipeline_stage: PipelineStage::Idle,
            current_question: None,
            sources_found: None,
            llm_status,
            index_status,
            event_rx: rx,
            event_tx: tx,
        }
    }

    /// Drain pending events from the background task
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::StageChanged(stage) => {
                if stage == PipelineStage::Retrieving {
                    self.index_status = ApiStatus::Ready;
                }
                self.pipeline_stage = stage;
            }
            AppEvent::SourcesFound(count) => {
                self.sources_found = Some(count);
            }
            AppEvent::ResponseComplete(response) => {
                self.messages.push(ChatMessage::new(MessageRole::Assistant, response));
                self.pipeline_stage = PipelineStage::Complete;
                self.scroll_to_bottom();
            }
            AppEvent::Error(error) => {
                self.pipeline_stage = PipelineStage::Error(error.clone());
                self.messages
                    .push(ChatMessage::new(MessageRole::System, format!("Error: {}", error)));
                self.scroll_to_bottom();
            }
        }
    }

    /// Handle a user action
    pub async fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit | AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Submit => {
                if self.view == View::Chat {
                    self.submit_message();
                }
            }
            AppAction::ToggleHelp => {
                self.view = if self.view == View::Help {
                    View::Chat
                } else {
                    View::Help
                };
            }
            AppAction::Escape => {
                self.view = View::Chat;
            }
            AppAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.follow_output = false;
            }
            AppAction::ScrollDown => {
                self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll);
                self.follow_output = self.scroll_offset == self.max_scroll;
            }
            AppAction::ScrollPageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                self.follow_output = false;
            }
            AppAction::ScrollPageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(self.max_scroll);
                self.follow_output = self.scroll_offset == self.max_scroll;
            }
            AppAction::ScrollTop => {
                self.scroll_offset = 0;
                self.follow_output = false;
            }
            AppAction::ScrollBottom => self.scroll_to_bottom(),
            AppAction::NextExample => self.cycle_example(true),
            AppAction::PrevExample => self.cycle_example(false),
            AppAction::Input(key_event) => {
                if self.view == View::Help {
                    // any key closes help
                    self.view = View::Chat;
                } else {
                    self.input.input(key_event);
                }
            }
            AppAction::Tick => {}
        }
    }

    /// Put the next (or previous) example question into the input box
    fn cycle_example(&mut self, forward: bool) {
        let count = EXAMPLE_QUESTIONS.len();
        let next = match (self.example_index, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.example_index = Some(next);
        self.input = TextArea::from([EXAMPLE_QUESTIONS[next]]);
        self.input.set_cursor_line_style(ratatui::style::Style::default());
        self.input.move_cursor(tui_textarea::CursorMove::End);
    }

    /// Submit the current message
    fn submit_message(&mut self) {
        if self.pipeline_stage.is_busy() {
            return;
        }

        let content = self.input.lines().join("\n");
        let question = match validate_query(&content) {
            Ok(q) => q.to_string(),
            Err(_) => return,
        };

        self.input = new_input();
        self.example_index = None;
        self.messages.push(ChatMessage::new(MessageRole::User, question.clone()));

        if self.llm_status == ApiStatus::NotConfigured {
            self.messages.push(ChatMessage::new(
                MessageRole::System,
                format!(
                    "No API key for {}. Set HF_TOKEN (or OPENAI_API_KEY) in .env and restart.",
                    self.config.llm.provider
                ),
            ));
            self.scroll_to_bottom();
            return;
        }

        self.pipeline_stage = if self.state.chain_loaded() {
            PipelineStage::Retrieving
        } else {
            PipelineStage::Loading
        };
        self.current_question = Some(question.clone());
        self.sources_found = None;

        let tx = self.event_tx.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            Self::run_question_pipeline(question, state, tx).await;
        });

        self.scroll_to_bottom();
    }

    /// Load the chain if needed, then retrieve and answer in the background
    async fn run_question_pipeline(question: String, state: AppState, tx: mpsc::Sender<AppEvent>) {
        if !state.chain_loaded() {
            tx.send(AppEvent::StageChanged(PipelineStage::Loading)).await.ok();
        }
        let chain = match state.rag_chain().await {
            Ok(chain) => chain,
            Err(e) => {
                error!(error = %e, "Failed to load RAG chain");
                tx.send(AppEvent::Error(e.to_string())).await.ok();
                return;
            }
        };

        tx.send(AppEvent::StageChanged(PipelineStage::Retrieving)).await.ok();
        let sources = match chain.retrieve(&question).await {
            Ok(sources) => sources,
            Err(e) => {
                tx.send(AppEvent::Error(e.to_string())).await.ok();
                return;
            }
        };
        tx.send(AppEvent::SourcesFound(sources.len())).await.ok();

        tx.send(AppEvent::StageChanged(PipelineStage::Generating)).await.ok();
        match chain.generate(&question, sources).await {
            Ok(response) => {
                info!(sources = response.source_documents.len(), "Question answered");
                tx.send(AppEvent::ResponseComplete(format_chat_reply(&response)))
                    .await
                    .ok();
            }
            Err(e) => {
                tx.send(AppEvent::Error(e.to_string())).await.ok();
            }
        }
    }

    fn scroll_to_bottom(&mut self) {
        self.follow_output = true;
        self.scroll_offset = self.max_scroll;
    }

    /// Recompute the scroll range for a terminal of the given size
    pub fn calculate_scroll_bounds(&mut self, width: u16, height: u16) {
        let (viewport_width, viewport_height) = crate::tui::ui::messages_viewport(width, height);
        let content_height =
            crate::tui::ui::message_lines(self, viewport_width).len().min(u16::MAX as usize) as u16;
        self.update_scroll_bounds(content_height, viewport_height);
    }

    /// Update max scroll based on content
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if self.follow_output || self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(ratatui::style::Style::default());
    input.set_placeholder_text(INPUT_PLACEHOLDER);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::rag::tests::test_chain;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::time::Duration;

    fn app_with_chain(answer: &str) -> App {
        let (chain, _) = test_chain(answer);
        App::with_state(AppState::with_chain(test_config(), Arc::new(chain)))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
                .await;
        }
    }

    #[tokio::test]
    async fn test_welcome_lists_examples() {
        let app = app_with_chain("unused");
        assert_eq!(app.messages[0].role, MessageRole::System);
        for example in EXAMPLE_QUESTIONS {
            assert!(app.messages[0].content.contains(example));
        }
        assert_eq!(app.index_status, ApiStatus::Ready);
    }

    #[tokio::test]
    async fn test_question_runs_through_pipeline() {
        let mut app = app_with_chain("Fees dominate card complaints.");
        type_text(&mut app, "card fee?").await;
        app.handle_action(AppAction::Submit).await;

        assert_eq!(app.pipeline_stage, PipelineStage::Retrieving);
        assert_eq!(app.current_question.as_deref(), Some("card fee?"));
        assert!(app.input.lines().join("").is_empty());

        for _ in 0..100 {
            app.poll_events();
            if app.pipeline_stage == PipelineStage::Complete {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(app.pipeline_stage, PipelineStage::Complete);
        assert_eq!(app.sources_found, Some(2));
        let reply = app.messages.last().unwrap();
        assert_eq!(reply.role, MessageRole::Assistant);
        assert!(reply.content.starts_with("Fees dominate card complaints."));
        assert!(reply.content.contains("**[1]** hidden fee on my card..."));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut app = app_with_chain("unused");
        type_text(&mut app, "   ").await;
        let before = app.messages.len();
        app.handle_action(AppAction::Submit).await;

        assert_eq!(app.messages.len(), before);
        assert_eq!(app.pipeline_stage, PipelineStage::Idle);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported_without_running() {
        let mut config = test_config();
        config.llm.hf_token.clear();
        let mut app = App::with_state(AppState::new(config));
        assert_eq!(app.llm_status, ApiStatus::NotConfigured);

        type_text(&mut app, "savings?").await;
        app.handle_action(AppAction::Submit).await;

        assert_eq!(app.pipeline_stage, PipelineStage::Idle);
        assert!(app.messages.last().unwrap().content.contains("No API key"));
    }

    #[tokio::test]
    async fn test_tab_cycles_example_questions() {
        let mut app = app_with_chain("unused");
        app.handle_action(AppAction::NextExample).await;
        assert_eq!(app.input.lines()[0], EXAMPLE_QUESTIONS[0]);
        app.handle_action(AppAction::NextExample).await;
        assert_eq!(app.input.lines()[0], EXAMPLE_QUESTIONS[1]);
        app.handle_action(AppAction::NextExample).await;
        assert_eq!(app.input.lines()[0], EXAMPLE_QUESTIONS[0]);
        app.handle_action(AppAction::PrevExample).await;
        assert_eq!(app.input.lines()[0], EXAMPLE_QUESTIONS[1]);
    }

    #[tokio::test]
    async fn test_error_event_is_shown() {
        let mut app = app_with_chain("unused");
        app.handle_event(AppEvent::Error("huggingface returned 503: loading".into()));
        assert!(matches!(app.pipeline_stage, PipelineStage::Error(_)));
        assert!(app.messages.last().unwrap().content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_scroll_bounds_follow_output_until_user_scrolls() {
        let mut app = app_with_chain("unused");
        app.update_scroll_bounds(50, 20);
        assert_eq!(app.max_scroll, 30);
        assert_eq!(app.scroll_offset, 30);

        app.handle_action(AppAction::ScrollPageUp).await;
        assert_eq!(app.scroll_offset, 20);
        app.update_scroll_bounds(60, 20);
        assert_eq!(app.scroll_offset, 20);

        app.handle_action(AppAction::ScrollBottom).await;
        assert_eq!(app.scroll_offset, 40);
        app.update_scroll_bounds(10, 20);
        assert_eq!(app.scroll_offset, 0);
    }

    #[tokio::test]
    async fn test_quit_actions_stop_the_app() {
        let mut app = app_with_chain("unused");
        app.handle_action(AppAction::ToggleHelp).await;
        app.handle_action(AppAction::Quit).await;
        assert!(app.should_quit);

        let mut app = app_with_chain("unused");
        type_text(&mut app, "card fee?").await;
        app.handle_action(AppAction::Submit).await;
        app.handle_action(AppAction::ForceQuit).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_help_toggles_and_closes_on_key() {
        let mut app = app_with_chain("unused");
        app.handle_action(AppAction::ToggleHelp).await;
        assert_eq!(app.view, View::Help);
        type_text(&mut app, "x").await;
        assert_eq!(app.view, View::Chat);
        assert!(app.input.lines().join("").is_empty());
    }
}
