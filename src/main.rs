use iced::widget::{button, column, container, row, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use std::sync::Arc;
use tracing::{error, info};

use quote_card::{logging, Config, DisplayState, ProbedQuote, Reaction, Session};

/// Main application state
struct QuoteCard {
    /// Fetches, votes, and owns the display state
    session: Arc<Session>,
    /// Last state published by the session
    display: Arc<DisplayState>,
    /// Most liked quotes, loaded on demand
    top: Option<Vec<ProbedQuote>>,
    show_top: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User asked for any random quote
    RandomQuote,
    /// User asked for another quote in the displayed category
    SameCategory,
    /// A fetch finished (or was superseded)
    Loaded,
    /// User clicked like or dislike
    React(Reaction),
    /// A vote resolved
    Voted(Result<(), String>),
    /// Show or hide the most liked panel
    ToggleTop,
    TopLoaded(Result<Vec<ProbedQuote>, String>),
}

impl QuoteCard {
    fn new(session: Arc<Session>) -> (Self, Task<Message>) {
        let display = session.current();
        let card = QuoteCard {
            session,
            display,
            top: None,
            show_top: false,
        };
        let task = card.load(None);
        (card, task)
    }

    fn load(&self, category: Option<String>) -> Task<Message> {
        let session = self.session.clone();
        Task::perform(
            async move {
                match category {
                    Some(category) => session.load_category(category).await,
                    None => session.load_random().await,
                };
            },
            |_| Message::Loaded,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::RandomQuote => self.load(None),
            Message::SameCategory => {
                let category = self
                    .display
                    .quote
                    .as_ref()
                    .and_then(|q| q.quote.category_name.clone());
                self.load(category)
            }
            // The session may have published again since the task finished,
            // so always read its latest state
            Message::Loaded => {
                self.display = self.session.current();
                Task::none()
            }
            Message::React(reaction) => {
                let session = self.session.clone();
                Task::perform(
                    async move {
                        session
                            .react(reaction)
                            .await
                            .map(|_| ())
                            .map_err(|e| e.to_string())
                    },
                    Message::Voted,
                )
            }
            Message::Voted(result) => {
                // Failures are surfaced on the card as a notice
                if let Err(reason) = result {
                    info!("Vote had no effect: {}", reason);
                }
                self.display = self.session.current();
                Task::none()
            }
            Message::ToggleTop => {
                self.show_top = !self.show_top;
                if !self.show_top {
                    return Task::none();
                }
                let session = self.session.clone();
                Task::perform(
                    async move { session.most_liked().await.map_err(|e| e.to_string()) },
                    Message::TopLoaded,
                )
            }
            Message::TopLoaded(Ok(top)) => {
                self.top = Some(top);
                Task::none()
            }
            Message::TopLoaded(Err(reason)) => {
                error!("Could not load most liked quotes: {}", reason);
                self.top = Some(Vec::new());
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let voting = self.session.is_voting();

        let card: Element<Message> = match &self.display.quote {
            Some(probed) => {
                let quote = &probed.quote;
                let image_line = if probed.image_accessible {
                    quote.image_url.clone().unwrap_or_default()
                } else {
                    quote
                        .image_alt_text
                        .clone()
                        .unwrap_or_else(|| "Image unavailable".to_string())
                };

                column![
                    text(format!("\u{201c}{}\u{201d}", quote.text)).size(28),
                    text(quote.author_label().to_string()).size(16),
                    text(image_line).size(12),
                    row![
                        reaction_button(Reaction::Like, quote.like_count, self.display.reaction, voting),
                        text(quote.category_label().to_string()).size(14),
                        reaction_button(Reaction::Dislike, quote.dislike_count, self.display.reaction, voting),
                    ]
                    .spacing(20)
                    .align_y(Alignment::Center),
                ]
                .spacing(12)
                .align_x(Alignment::Center)
                .into()
            }
            None => {
                let message = if self.display.loading {
                    "Loading..."
                } else {
                    self.display.notice.as_deref().unwrap_or("No quote data.")
                };
                text(message).size(20).into()
            }
        };

        let notice = match (&self.display.quote, &self.display.notice) {
            (Some(_), Some(notice)) => text(notice.clone()).size(12),
            _ => text(""),
        };

        let controls = row![
            button("Random quote")
                .on_press(Message::RandomQuote)
                .padding(10),
            button("Another in this category")
                .on_press_maybe(self.display.quote.as_ref().map(|_| Message::SameCategory))
                .padding(10),
            button(if self.show_top { "Hide most liked" } else { "Most liked" })
                .on_press(Message::ToggleTop)
                .padding(10),
        ]
        .spacing(10);

        let mut content: Column<Message> = column![card, notice, controls]
            .spacing(20)
            .padding(40)
            .align_x(Alignment::Center);

        if self.show_top {
            content = content.push(self.top_panel());
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn top_panel(&self) -> Element<Message> {
        match &self.top {
            None => text("Loading...").size(14).into(),
            Some(top) if top.is_empty() => text("No quotes yet.").size(14).into(),
            Some(top) => Column::with_children(top.iter().map(|probed| {
                let quote = &probed.quote;
                text(format!(
                    "{} - {} ({} likes)",
                    quote.text,
                    quote.author_label(),
                    quote.like_count
                ))
                .size(14)
                .into()
            }))
            .spacing(6)
            .into(),
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Like/dislike button, highlighted when the ledger holds that reaction
fn reaction_button<'a>(
    kind: Reaction,
    count: u64,
    held: Option<Reaction>,
    voting: bool,
) -> Element<'a, Message> {
    let label = match kind {
        Reaction::Like => format!("LIKE {}", count),
        Reaction::Dislike => format!("DISLIKE {}", count),
    };
    let style: fn(&Theme, button::Status) -> button::Style = if held == Some(kind) {
        button::primary
    } else {
        button::secondary
    };

    button(text(label))
        .style(style)
        .padding(10)
        .on_press_maybe((!voting).then_some(Message::React(kind)))
        .into()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init(&config.log_filter);

    let session = match Session::from_config(&config) {
        Ok(session) => Arc::new(session),
        Err(e) => {
            error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    info!("🎨 Quote card starting against {}", config.api_url);

    iced::application("Random Quote", QuoteCard::update, QuoteCard::view)
        .theme(QuoteCard::theme)
        .centered()
        .run_with(move || QuoteCard::new(session))?;

    Ok(())
}

