//! Hierarchical reduction of chunk summaries
//!
//! Summaries are combined in one call when the combine request, system
//! prompt included, fits the model's chunk limit. Otherwise the list is
//! halved and each half reduced on its own before the two results are
//! combined. A pair that still does not fit has each side truncated to an
//! equal share of the room left.

use crate::completion::CompletionRunner;
use crate::prompts::{COMBINE_SYSTEM_PROMPT, combine_prompt};
use crate::summarizer::Summary;
use crate::SummarizationResult;
use chunkwise_config::ModelProfile;
use chunkwise_parsing::ParsingError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Folds any number of summaries into one
pub struct HierarchicalReducer {
    runner: Arc<CompletionRunner>,
}

impl HierarchicalReducer {
    pub fn new(runner: Arc<CompletionRunner>) -> Self {
        Self { runner }
    }

    /// Reduce `summaries`, in order, to a single summary
    ///
    /// No call is made for zero or one summaries. Order is preserved: the
    /// left half of every split is combined before the right.
    ///
    /// # Errors
    /// Returns completion errors, `SummarizationError::Cancelled`, or a
    /// chunk overflow when two summaries cannot share one prompt
    pub fn reduce<'a>(
        &'a self,
        summaries: &'a [Summary],
        profile: &'a ModelProfile,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, SummarizationResult<Summary>> {
        async move {
            match summaries {
                [] => return Ok(Summary::default()),
                [only] => return Ok(only.clone()),
                _ => {}
            }

            let limit = profile.max_tokens_per_chunk();
            let room = self.prompt_room(limit);
            let target = profile.target_summary_tokens();
            let counter = self.runner.counter();

            let prompt = combine_prompt(target, texts(summaries).as_slice());
            let prompt_tokens = counter.count(&prompt);
            if prompt_tokens <= room {
                return self.combine(prompt, profile, cancel).await;
            }

            if summaries.len() > 2 {
                tracing::debug!(
                    parts = summaries.len(),
                    prompt_tokens,
                    room,
                    "Combine prompt too large, splitting"
                );
                let (left, right) = summaries.split_at(summaries.len() / 2);
                let left = self.reduce(left, profile, cancel).await?;
                let right = self.reduce(right, profile, cancel).await?;
                let pair = [left, right];
                return self.reduce(&pair, profile, cancel).await;
            }

            let prompt = self.fit_pair(summaries, target, room, limit)?;
            self.combine(prompt, profile, cancel).await
        }
        .boxed()
    }

    /// Tokens left for the user prompt once the combine system prompt is
    /// counted against `limit`
    fn prompt_room(&self, limit: usize) -> usize {
        limit.saturating_sub(self.runner.counter().count(COMBINE_SYSTEM_PROMPT))
    }

    /// Truncate both sides of a pair until their combine prompt fits in
    /// `room`
    fn fit_pair(
        &self,
        pair: &[Summary],
        target: usize,
        room: usize,
        limit: usize,
    ) -> SummarizationResult<String> {
        let counter = self.runner.counter();
        let frame = counter.count(&combine_prompt(target, &["", ""]));
        let mut share = room.saturating_sub(frame) / 2;

        tracing::warn!(
            share,
            room,
            limit,
            "Truncating summary pair to fit combine prompt"
        );
        while share > 0 {
            let parts: Vec<String> = pair
                .iter()
                .map(|summary| counter.truncate(&summary.text, share))
                .collect();
            let prompt = combine_prompt(target, parts.as_slice());
            let tokens = counter.count(&prompt);
            if tokens <= room {
                return Ok(prompt);
            }
            share = share.saturating_sub(tokens - room).min(share - 1);
        }

        Err(ParsingError::chunk_overflow(
            limit,
            "combine prompt does not fit even with summaries truncated",
        )
        .into())
    }

    async fn combine(
        &self,
        prompt: String,
        profile: &ModelProfile,
        cancel: &CancellationToken,
    ) -> SummarizationResult<Summary> {
        metrics::counter!("chunkwise_reduce_calls_total").increment(1);
        self.runner
            .run(
                "combine_summaries",
                COMBINE_SYSTEM_PROMPT,
                prompt,
                profile.context_window(),
                cancel,
            )
            .await
    }
}

fn texts(summaries: &[Summary]) -> Vec<&str> {
    summaries.iter().map(|summary| summary.text.as_str()).collect()
}
