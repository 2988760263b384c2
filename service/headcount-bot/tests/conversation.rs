use async_trait::async_trait;
use chrono::Utc;
use headcount_bot::{
    AdapterStatus, Category, CategoryRegistry, ChatAdapter, ChatId, Dispatch, HeadcountBot,
    HeadcountError, InboundMessage, OutgoingMessage, ReportLog, SendReceipt, SessionState,
    UpdateBatch,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

const CHAT: ChatId = ChatId(916091427);

#[derive(Default)]
struct MockAdapter {
    sent: Mutex<Vec<OutgoingMessage>>,
    fail_sends: bool,
}

impl MockAdapter {
    async fn texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }

    async fn last_text(&self) -> String {
        self.sent
            .lock()
            .await
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatAdapter for MockAdapter {
    fn id(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> headcount_bot::Result<AdapterStatus> {
        Ok(AdapterStatus {
            is_online: true,
            last_checked_at: Utc::now(),
            details: None,
            username: Some("HeadcountBot".to_string()),
        })
    }

    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        _timeout: Duration,
    ) -> headcount_bot::Result<UpdateBatch> {
        Ok(UpdateBatch {
            messages: Vec::new(),
            next_offset: offset,
        })
    }

    async fn send_message(&self, message: OutgoingMessage) -> headcount_bot::Result<SendReceipt> {
        if self.fail_sends {
            return Err(HeadcountError::other("network down"));
        }
        let chat_id = message.chat_id;
        let mut sent = self.sent.lock().await;
        sent.push(message);
        Ok(SendReceipt {
            message_id: sent.len().to_string(),
            timestamp: Utc::now(),
            chat_id,
        })
    }
}

struct Harness {
    bot: HeadcountBot,
    adapter: Arc<MockAdapter>,
    log_path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::with_adapter(MockAdapter::default())
    }

    fn with_adapter(adapter: MockAdapter) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("headcount.csv");
        let registry = Arc::new(
            CategoryRegistry::new(vec![Category::new("A", 2), Category::new("B", 1)]).unwrap(),
        );
        let log = ReportLog::new(&log_path, registry.header("Date"));
        let adapter = Arc::new(adapter);
        let bot = HeadcountBot::new(adapter.clone() as Arc<dyn ChatAdapter>, registry, log)
            .with_username("HeadcountBot");
        Self {
            bot,
            adapter,
            log_path,
            _dir: dir,
        }
    }

    async fn send(&self, text: &str) -> Dispatch {
        self.bot
            .handle(InboundMessage::text(CHAT, text))
            .await
            .unwrap()
    }

    fn log_rows(&self) -> Vec<Vec<String>> {
        ReportLog::new(&self.log_path, vec!["Date".into(), "A".into(), "B".into()])
            .load()
            .unwrap()
    }
}

#[tokio::test]
async fn full_scenario_with_rejections() {
    let h = Harness::new();

    assert_eq!(h.send("/start").await, Dispatch::Started);
    assert_eq!(h.adapter.last_text().await, "Введите количество для: A (макс. 2)");

    assert_eq!(h.send("5").await, Dispatch::Rejected { index: 0 });
    assert_eq!(
        h.adapter.last_text().await,
        "❗ Введите число от 0 до 2 для A.\nВведите количество для: A (макс. 2)"
    );
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(0));

    assert_eq!(h.send("1").await, Dispatch::Prompted { index: 1 });
    assert_eq!(h.adapter.last_text().await, "Введите количество для: B (макс. 1)");

    assert_eq!(h.send("abc").await, Dispatch::Rejected { index: 1 });
    assert_eq!(
        h.adapter.last_text().await,
        "❗ Пожалуйста, введите целое число.\nВведите количество для: B (макс. 1)"
    );
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(1));

    assert_eq!(h.send("0").await, Dispatch::Completed { persisted: true });
    assert_eq!(
        h.adapter.last_text().await,
        "📋 Отчёт по рабочим:\nA: 1\nB: 0\n\n✅ Спасибо! Данные приняты."
    );
    assert_eq!(h.bot.state(CHAT).await, SessionState::Completed);

    let rows = h.log_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 3);
    assert_eq!(rows[0][0].len(), "2024-03-05 09:00".len());
    assert_eq!(&rows[0][1..], &["1".to_string(), "0".to_string()]);
}

#[tokio::test]
async fn cancel_mid_conversation_appends_nothing() {
    let h = Harness::new();
    h.send("/start").await;
    h.send("2").await;
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(1));

    assert_eq!(
        h.send("/cancel").await,
        Dispatch::Cancelled { had_session: true }
    );
    assert_eq!(h.adapter.last_text().await, "❌ Ввод отменён.");
    assert_eq!(h.bot.state(CHAT).await, SessionState::Cancelled);
    assert!(!h.log_path.exists());

    assert_eq!(h.send("1").await, Dispatch::Ignored);
}

#[tokio::test]
async fn cancel_without_session_still_acknowledges() {
    let h = Harness::new();
    assert_eq!(
        h.send("/cancel").await,
        Dispatch::Cancelled { had_session: false }
    );
    assert_eq!(h.adapter.last_text().await, "❌ Ввод отменён.");
    assert_eq!(h.bot.state(CHAT).await, SessionState::Idle);
}

#[tokio::test]
async fn text_outside_conversation_is_ignored() {
    let h = Harness::new();
    assert_eq!(h.send("hello").await, Dispatch::Ignored);
    assert_eq!(h.send("/help").await, Dispatch::Ignored);
    assert!(h.adapter.texts().await.is_empty());
}

#[tokio::test]
async fn id_command_echoes_chat_id_mid_conversation() {
    let h = Harness::new();
    h.send("/start").await;
    assert_eq!(h.send("/id").await, Dispatch::EchoedId);
    assert_eq!(h.adapter.last_text().await, "Ваш chat_id: 916091427");
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(0));
}

#[tokio::test]
async fn commands_for_other_bots_leave_the_session_alone() {
    let h = Harness::new();
    h.send("/start").await;
    h.send("1").await;

    assert_eq!(h.send("/cancel@SomeOtherBot").await, Dispatch::Ignored);
    assert_eq!(h.send("/start@SomeOtherBot").await, Dispatch::Ignored);
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(1));
    assert_eq!(h.adapter.texts().await.len(), 2);

    assert_eq!(
        h.send("/cancel@headcountbot").await,
        Dispatch::Cancelled { had_session: true }
    );
    assert_eq!(h.bot.state(CHAT).await, SessionState::Cancelled);
}

#[tokio::test]
async fn restart_resets_progress() {
    let h = Harness::new();
    h.send("/start").await;
    h.send("1").await;
    assert_eq!(h.send("/start").await, Dispatch::Started);
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(0));
}

#[tokio::test]
async fn consecutive_reports_append_in_order() {
    let h = Harness::new();
    for (a, b) in [("2", "1"), ("0", "0"), ("1", "1")] {
        h.send("/start").await;
        h.send(a).await;
        assert_eq!(h.send(b).await, Dispatch::Completed { persisted: true });
    }

    let values: Vec<Vec<String>> = h.log_rows().into_iter().map(|r| r[1..].to_vec()).collect();
    assert_eq!(
        values,
        vec![vec!["2", "1"], vec!["0", "0"], vec!["1", "1"]]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_completions_each_append_one_row() {
    let h = Arc::new(Harness::new());
    let chats: Vec<ChatId> = (1..=4).map(ChatId).collect();

    let tasks: Vec<_> = chats
        .iter()
        .map(|&chat| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                for text in ["/start", "2", "1"] {
                    h.bot.handle(InboundMessage::text(chat, text)).await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let rows = h.log_rows();
    assert_eq!(rows.len(), chats.len());
    assert!(rows.iter().all(|r| r[1..] == ["2".to_string(), "1".to_string()]));
}

#[tokio::test]
async fn chats_progress_independently() {
    let h = Harness::new();
    let other = ChatId(5);
    h.send("/start").await;
    h.bot
        .handle(InboundMessage::text(other, "/start"))
        .await
        .unwrap();
    h.send("2").await;

    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(1));
    assert_eq!(h.bot.state(other).await, SessionState::AwaitingInput(0));
}

#[tokio::test]
async fn persistence_failure_does_not_undo_completion() {
    let h = Harness::new();
    std::fs::write(&h.log_path, "Something,Else\n1,2\n").unwrap();

    h.send("/start").await;
    h.send("1").await;
    assert_eq!(h.send("1").await, Dispatch::Completed { persisted: false });
    assert!(h.adapter.last_text().await.contains("A: 1\nB: 1"));
    assert_eq!(h.bot.state(CHAT).await, SessionState::Completed);
    assert_eq!(
        std::fs::read_to_string(&h.log_path).unwrap(),
        "Something,Else\n1,2\n"
    );
}

#[tokio::test]
async fn row_is_stored_even_if_summary_delivery_fails() {
    let h = Harness::with_adapter(MockAdapter {
        fail_sends: true,
        ..MockAdapter::default()
    });

    assert!(h.bot.handle(InboundMessage::text(CHAT, "/start")).await.is_err());
    assert_eq!(h.bot.state(CHAT).await, SessionState::AwaitingInput(0));
    assert!(h.bot.handle(InboundMessage::text(CHAT, "2")).await.is_err());
    assert!(h.bot.handle(InboundMessage::text(CHAT, "0")).await.is_err());

    assert_eq!(h.bot.state(CHAT).await, SessionState::Completed);
    assert_eq!(h.log_rows().len(), 1);
}
