use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    chat::{ChatMessage, ChatProvider},
    context::EvalContext,
    error::EvalError,
    metric::Metric,
    sample::Sample,
};

const NAME: &str = "hallucination";

const GRADER_INSTRUCTIONS: &str = "You are checking an answer for hallucinations. \
Rate how well the answer is supported by the documents, from 0.0 (fabricated) \
to 1.0 (fully supported). Reply with the number only.";

/// LLM-as-judge check that the output is grounded in the retrieved documents.
///
/// The judge answers with a single number: 1.0 for a fully supported
/// output, 0.0 for a fabricated one. Replies outside `[0, 1]` are clamped.
pub struct Hallucination {
    model: Arc<dyn ChatProvider>,
}

impl Hallucination {
    pub fn new(model: Arc<dyn ChatProvider>) -> Self {
        Self { model }
    }
}

fn build_prompt(sample: &Sample) -> String {
    let documents = if sample.retrieved_docs.is_empty() {
        "(no documents provided)".to_string()
    } else {
        sample
            .retrieved_docs
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("[{}] {}", i + 1, doc.content))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Documents:\n{documents}\n\n\
         Question: {}\n\n\
         Answer: {}",
        sample.input, sample.output
    )
}

fn parse_score(reply: &str) -> Result<f64, EvalError> {
    let trimmed = reply.trim();
    let score: f64 = trimmed.parse().map_err(|err| {
        EvalError::metric(NAME, format!("failed to parse score {trimmed:?}: {err}"))
    })?;
    if !score.is_finite() {
        return Err(EvalError::metric(
            NAME,
            format!("failed to parse score {trimmed:?}: not finite"),
        ));
    }
    Ok(score.clamp(0.0, 1.0))
}

#[async_trait]
impl Metric for Hallucination {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError> {
        let messages = [
            ChatMessage::system().content(GRADER_INSTRUCTIONS).build(),
            ChatMessage::user().content(build_prompt(sample)).build(),
        ];
        let reply = tokio::select! {
            biased;
            _ = ctx.done() => return Err(ctx.err().unwrap_or(EvalError::Cancelled)),
            reply = self.model.chat_text(&messages) => reply,
        };
        let reply = reply.map_err(|err| EvalError::metric(NAME, format!("llm generate: {err}")))?;
        parse_score(&reply)
    }
}

impl std::fmt::Debug for Hallucination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hallucination").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use rstest::rstest;

    use super::*;
    use crate::{
        chat::{ChatResponse, ChatRole},
        sample::Document,
    };

    struct MockJudge {
        reply: Result<String, EvalError>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        calls: AtomicUsize,
    }

    impl MockJudge {
        fn replying(reply: &str) -> Arc<Self> {
            Self::with(Ok(reply.to_string()))
        }

        fn with(reply: Result<String, EvalError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn last_request(&self) -> Vec<ChatMessage> {
            self.requests
                .lock()
                .expect("requests lock")
                .last()
                .cloned()
                .unwrap_or_default()
        }

        fn last_prompt(&self) -> String {
            self.last_request()
                .last()
                .map(|msg| msg.content.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatProvider for MockJudge {
        async fn chat(
            &self,
            messages: &[ChatMessage],
        ) -> Result<Box<dyn ChatResponse>, EvalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests lock")
                .push(messages.to_vec());
            self.reply
                .clone()
                .map(|text| Box::new(text) as Box<dyn ChatResponse>)
        }
    }

    fn grounded_sample() -> Sample {
        Sample::new("What is Go?", "Go is a programming language.")
            .document(Document::new("doc1", "Go is a programming language created by Google."))
    }

    async fn score_with(judge: Arc<MockJudge>, sample: &Sample) -> Result<f64, EvalError> {
        Hallucination::new(judge)
            .score(&EvalContext::new(), sample)
            .await
    }

    #[tokio::test]
    async fn grounded_answer_scores_one() {
        let judge = MockJudge::replying("1.0");
        let score = score_with(Arc::clone(&judge), &grounded_sample())
            .await
            .expect("score");
        assert_eq!(score, 1.0);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
        assert!(judge.last_prompt().contains("Go is a programming language created by Google."));
    }

    #[tokio::test]
    async fn grading_instructions_go_in_system_message() {
        let judge = MockJudge::replying("1.0");
        score_with(Arc::clone(&judge), &grounded_sample())
            .await
            .expect("score");
        let request = judge.last_request();
        let roles: Vec<ChatRole> = request.iter().map(|msg| msg.role.clone()).collect();
        assert_eq!(roles, vec![ChatRole::System, ChatRole::User]);
        assert!(request[0].content.contains("Reply with the number only."));
        assert!(request[1].content.contains("Answer: Go is a programming language."));
    }

    #[rstest]
    #[case("0.0", 0.0)]
    #[case("0.5", 0.5)]
    #[case("0.666", 0.666)]
    #[case("5.0", 1.0)]
    #[case("-2.0", 0.0)]
    #[case("\n  0.95  \t\n", 0.95)]
    #[tokio::test]
    async fn parses_and_clamps_replies(#[case] reply: &str, #[case] expected: f64) {
        let score = score_with(MockJudge::replying(reply), &grounded_sample())
            .await
            .expect("score");
        assert!((score - expected).abs() < 0.001);
    }

    #[tokio::test]
    async fn missing_documents_are_announced() {
        let judge = MockJudge::replying("1.0");
        let score = score_with(Arc::clone(&judge), &Sample::new("What is Go?", "A language."))
            .await
            .expect("score");
        assert_eq!(score, 1.0);
        assert!(judge.last_prompt().contains("(no documents provided)"));
    }

    #[tokio::test]
    async fn every_document_reaches_the_prompt() {
        let judge = MockJudge::replying("1.0");
        let sample = Sample::new("What is Go?", "Go is a statically typed language by Google.")
            .document(Document::new("doc1", "Go is a programming language."))
            .document(Document::new("doc2", "Go was created by Google."))
            .document(Document::new("doc3", "Go is statically typed."));
        score_with(Arc::clone(&judge), &sample).await.expect("score");
        let prompt = judge.last_prompt();
        assert!(prompt.contains("[1] Go is a programming language."));
        assert!(prompt.contains("[3] Go is statically typed."));
    }

    #[tokio::test]
    async fn judge_failure_is_wrapped() {
        let judge = MockJudge::with(Err(EvalError::Provider("llm error".into())));
        let err = score_with(judge, &grounded_sample())
            .await
            .expect_err("judge fails");
        let msg = err.to_string();
        assert!(msg.contains("hallucination"), "{msg}");
        assert!(msg.contains("llm generate"), "{msg}");
    }

    #[tokio::test]
    async fn invalid_reply_is_rejected() {
        let err = score_with(MockJudge::replying("invalid"), &grounded_sample())
            .await
            .expect_err("unparsable");
        assert!(err.to_string().contains("failed to parse score"));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let judge = MockJudge::replying("1.0");
        let ctx = EvalContext::new();
        ctx.cancel();
        let err = Hallucination::new(judge)
            .score(&ctx, &grounded_sample())
            .await
            .expect_err("cancelled");
        assert_eq!(err, EvalError::Cancelled);
    }
}
