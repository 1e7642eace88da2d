//! Estimated reading time

use super::PostDetail;

/// Reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Whole minutes needed to read `words`, rounded up
pub fn minutes_for(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}

/// Reading time of a detail page.
///
/// Starts at 0 and is only recomputed when the post identity or the
/// fallback flag changes. While the page is in fallback nothing is counted,
/// since the post content is not there yet.
#[derive(Debug, Clone)]
pub struct ReadingTime {
    words_per_minute: usize,
    minutes: usize,
    seen: Option<(String, bool)>,
    computations: usize,
}

impl ReadingTime {
    pub fn new(words_per_minute: usize) -> Self {
        Self {
            words_per_minute,
            minutes: 0,
            seen: None,
            computations: 0,
        }
    }

    pub fn minutes(&self) -> usize {
        self.minutes
    }

    /// How many times words were actually counted
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// Feed the current page state, returning the reading time to display
    pub fn update(&mut self, post: Option<&PostDetail>, is_fallback: bool) -> usize {
        let identity = (
            post.map(|p| p.uid.clone()).unwrap_or_default(),
            is_fallback,
        );
        if self.seen.as_ref() == Some(&identity) {
            return self.minutes;
        }
        self.seen = Some(identity);

        if is_fallback {
            return self.minutes;
        }
        if let Some(post) = post {
            self.minutes = minutes_for(post.word_count(), self.words_per_minute);
            self.computations += 1;
            tracing::debug!("Reading time for {}: {} min", post.uid, self.minutes);
        }
        self.minutes
    }
}

impl Default for ReadingTime {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_MINUTE)
    }
}
