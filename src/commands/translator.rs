//! Result translation.
//!
//! Maps a [`CommandResult`] to at most one message [`Operation`] and executes it
//! through the [`MessageSink`]. The only state is the [`DispatchSession`], which is
//! passed in and handed back on every call so it never lives on shared state.
//!
//! # Transitions
//!
//! | Result     | Operation                                   | Session               |
//! |------------|---------------------------------------------|-----------------------|
//! | `Empty`    | none                                        | unchanged             |
//! | `Reply`    | create, reply to the invoking message       | records the message   |
//! | `Send`     | create in the invoking channel              | records the message   |
//! | `FollowUp` | create, reply to the recorded message if any| unchanged             |
//! | `Edit`     | edit the recorded message if any            | unchanged             |
//!
//! Follow-ups never advance the session, so chained follow-ups all reply to the
//! same message.

use log::debug;
use serde::Serialize;

use crate::{
    commands::result::{CommandResult, MessageContent},
    platform::{InvokingMessage, Message, MessageEdit, MessageSink, OutboundMessage, ReplyTo},
};

/// Per dispatch state: the most recent message created by a `Reply` or `Send`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSession {
    last_message: Option<Message>,
}

impl DispatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.last_message.as_ref()
    }

    pub fn into_last_message(self) -> Option<Message> {
        self.last_message
    }
}

/// Abstract output operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operation {
    Create(OutboundMessage),
    Edit(MessageEdit),
}

/// Computes the operation for `result` without performing it.
pub fn plan(
    session: &DispatchSession,
    invoking: &InvokingMessage,
    result: CommandResult,
) -> Option<Operation> {
    let create = |content: MessageContent, reply_to: Option<ReplyTo>| {
        Operation::Create(OutboundMessage {
            channel_id: invoking.channel_id,
            content: content.text,
            embeds: content.embeds,
            reply_to,
        })
    };

    match result {
        CommandResult::Empty => None,
        CommandResult::Reply { mention, content } => Some(create(
            content,
            Some(ReplyTo {
                message_id: invoking.id,
                mention,
            }),
        )),
        CommandResult::Send(content) => Some(create(content, None)),
        CommandResult::FollowUp(content) => {
            let reply_to = session.last_message().map(|last| ReplyTo {
                message_id: last.id,
                mention: false,
            });
            Some(create(content, reply_to))
        }
        CommandResult::Edit(content) => session.last_message().map(|last| {
            Operation::Edit(MessageEdit {
                channel_id: last.channel_id,
                message_id: last.id,
                content: content.text,
                embeds: content.embeds,
            })
        }),
    }
}

/// Translates `result` into an operation, performs it and returns the updated
/// session together with the created or edited message.
///
/// # Errors
///
/// Any sink failure is returned as is and is fatal to the dispatch.
pub async fn translate(
    sink: &dyn MessageSink,
    invoking: &InvokingMessage,
    session: DispatchSession,
    result: CommandResult,
) -> anyhow::Result<(DispatchSession, Option<Message>)> {
    let records = matches!(result, CommandResult::Reply { .. } | CommandResult::Send(_));
    let kind = result.kind();

    let Some(operation) = plan(&session, invoking, result) else {
        debug!("no operation for {} result", kind);
        return Ok((session, None));
    };

    debug!("performing {:?} for {} result", operation, kind);
    let message = match operation {
        Operation::Create(outbound) => sink.create_message(outbound).await?,
        Operation::Edit(edit) => sink.edit_message(edit).await?,
    };

    let session = if records {
        DispatchSession {
            last_message: Some(message.clone()),
        }
    } else {
        session
    };

    Ok((session, Some(message)))
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate};

    use super::*;
    use crate::platform::{Embed, MockMessageSink, User};

    fn create_test_invoking() -> InvokingMessage {
        InvokingMessage {
            id: 1,
            channel_id: 10,
            guild_id: Some(100),
            author: User {
                id: 7,
                name: "alice".to_string(),
                bot: false,
            },
            content: "!ping".to_string(),
        }
    }

    fn message(id: u64, text: &str) -> Message {
        Message {
            id,
            channel_id: 10,
            content: Some(text.to_string()),
            embeds: vec![],
        }
    }

    fn session_with(id: u64) -> DispatchSession {
        DispatchSession {
            last_message: Some(message(id, "previous")),
        }
    }

    #[test]
    fn test_plan_empty() {
        let invoking = create_test_invoking();
        assert_eq!(
            plan(&DispatchSession::new(), &invoking, CommandResult::Empty),
            None
        );
    }

    #[test]
    fn test_plan_reply_carries_mention_flag() {
        let invoking = create_test_invoking();

        let Some(Operation::Create(outbound)) =
            plan(&DispatchSession::new(), &invoking, CommandResult::reply("ok"))
        else {
            panic!("expected a create operation");
        };
        assert_eq!(
            outbound.reply_to,
            Some(ReplyTo {
                message_id: 1,
                mention: false
            })
        );
        assert_eq!(outbound.channel_id, 10);
        assert_eq!(outbound.content.as_deref(), Some("ok"));

        let Some(Operation::Create(outbound)) = plan(
            &DispatchSession::new(),
            &invoking,
            CommandResult::reply_with_mention("ok"),
        ) else {
            panic!("expected a create operation");
        };
        assert!(outbound.reply_to.unwrap().mention);
    }

    #[test]
    fn test_plan_send_is_not_a_reply() {
        let invoking = create_test_invoking();
        let operation = plan(
            &session_with(5),
            &invoking,
            CommandResult::send(Embed::titled("Hi")),
        );
        assert_eq!(
            operation,
            Some(Operation::Create(OutboundMessage {
                channel_id: 10,
                content: None,
                embeds: vec![Embed::titled("Hi")],
                reply_to: None,
            }))
        );
    }

    #[test]
    fn test_plan_follow_up() {
        let invoking = create_test_invoking();

        let Some(Operation::Create(without_last)) = plan(
            &DispatchSession::new(),
            &invoking,
            CommandResult::follow_up("more"),
        ) else {
            panic!("expected a create operation");
        };
        assert_eq!(without_last.reply_to, None);

        let Some(Operation::Create(with_last)) =
            plan(&session_with(5), &invoking, CommandResult::follow_up("more"))
        else {
            panic!("expected a create operation");
        };
        assert_eq!(
            with_last.reply_to,
            Some(ReplyTo {
                message_id: 5,
                mention: false
            })
        );
    }

    #[test]
    fn test_plan_edit() {
        let invoking = create_test_invoking();
        assert_eq!(
            plan(&DispatchSession::new(), &invoking, CommandResult::edit("new")),
            None
        );
        assert_eq!(
            plan(&session_with(5), &invoking, CommandResult::edit("new")),
            Some(Operation::Edit(MessageEdit {
                channel_id: 10,
                message_id: 5,
                content: Some("new".to_string()),
                embeds: vec![],
            }))
        );
    }

    #[tokio::test]
    async fn test_translate_reply_records_message() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .withf(|outbound| {
                outbound.reply_to
                    == Some(ReplyTo {
                        message_id: 1,
                        mention: false,
                    })
                    && outbound.content.as_deref() == Some("ok")
            })
            .times(1)
            .returning(|_| Ok(message(50, "ok")));
        sink.expect_edit_message().never();

        let (session, created) = translate(
            &sink,
            &invoking,
            DispatchSession::new(),
            CommandResult::reply("ok"),
        )
        .await
        .unwrap();

        assert_eq!(created.map(|m| m.id), Some(50));
        assert_eq!(session.last_message().map(|m| m.id), Some(50));
    }

    #[tokio::test]
    async fn test_translate_empty_does_nothing() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        sink.expect_create_message().never();
        sink.expect_edit_message().never();

        let (session, created) = translate(
            &sink,
            &invoking,
            session_with(5),
            CommandResult::Empty,
        )
        .await
        .unwrap();

        assert!(created.is_none());
        assert_eq!(session, session_with(5));
    }

    #[tokio::test]
    async fn test_follow_up_chain_replies_to_first_message() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        let mut sequence = Sequence::new();

        sink.expect_create_message()
            .withf(|outbound| outbound.reply_to.map(|r| r.message_id) == Some(1))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(message(50, "first")));
        sink.expect_create_message()
            .withf(|outbound| outbound.reply_to.map(|r| r.message_id) == Some(50))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(message(51, "second")));
        sink.expect_create_message()
            .withf(|outbound| outbound.reply_to.map(|r| r.message_id) == Some(50))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(message(52, "third")));

        let mut session = DispatchSession::new();
        for result in [
            CommandResult::reply("first"),
            CommandResult::follow_up("second"),
            CommandResult::follow_up("third"),
        ] {
            let (next, _) = translate(&sink, &invoking, session, result).await.unwrap();
            session = next;
        }

        assert_eq!(session.last_message().map(|m| m.id), Some(50));
    }

    #[tokio::test]
    async fn test_follow_up_targets_latest_send() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        let mut sequence = Sequence::new();

        sink.expect_create_message()
            .withf(|outbound| outbound.reply_to.is_none())
            .times(2)
            .in_sequence(&mut sequence)
            .returning({
                let mut next_id = 60;
                move |outbound| {
                    next_id += 1;
                    Ok(Message {
                        id: next_id,
                        channel_id: outbound.channel_id,
                        content: outbound.content,
                        embeds: outbound.embeds,
                    })
                }
            });
        sink.expect_create_message()
            .withf(|outbound| outbound.reply_to.map(|r| r.message_id) == Some(62))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(message(63, "follow-up")));

        let mut session = DispatchSession::new();
        for result in [
            CommandResult::send("one"),
            CommandResult::send("two"),
            CommandResult::follow_up("follow-up"),
        ] {
            let (next, _) = translate(&sink, &invoking, session, result).await.unwrap();
            session = next;
        }

        assert_eq!(session.last_message().map(|m| m.id), Some(62));
    }

    #[tokio::test]
    async fn test_edit_keeps_session() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        sink.expect_edit_message()
            .with(predicate::eq(MessageEdit {
                channel_id: 10,
                message_id: 5,
                content: Some("edited".to_string()),
                embeds: vec![],
            }))
            .times(1)
            .returning(|_| Ok(message(5, "edited")));

        let (session, edited) = translate(
            &sink,
            &invoking,
            session_with(5),
            CommandResult::edit("edited"),
        )
        .await
        .unwrap();

        assert_eq!(edited.and_then(|m| m.content), Some("edited".to_string()));
        assert_eq!(session, session_with(5));
    }

    #[tokio::test]
    async fn test_edit_without_message_is_noop() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        sink.expect_edit_message().never();

        let (session, edited) = translate(
            &sink,
            &invoking,
            DispatchSession::new(),
            CommandResult::edit("edited"),
        )
        .await
        .unwrap();

        assert!(edited.is_none());
        assert!(session.last_message().is_none());
    }

    #[tokio::test]
    async fn test_sink_failure_propagates() {
        let invoking = create_test_invoking();
        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let result = translate(
            &sink,
            &invoking,
            DispatchSession::new(),
            CommandResult::send("hello"),
        )
        .await;

        assert!(result.unwrap_err().to_string().contains("connection reset"));
    }
}
