use anyhow::Result;
use fantoccini::elements::Element;
use rand::rngs::OsRng;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::time::sleep;

/// Pacing applied to page interactions so form filling looks like a person.
#[derive(Debug, Clone)]
pub struct BehavioralEngine {
    /// Pause before a navigation, in milliseconds.
    pub navigation_ms: RangeInclusive<u64>,
    /// Pause before a click.
    pub click_ms: RangeInclusive<u64>,
    /// Pause after each typed character.
    pub keystroke_ms: RangeInclusive<u64>,
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self {
            navigation_ms: 300..=1200,
            click_ms: 100..=400,
            keystroke_ms: 30..=150,
        }
    }
}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            navigation_ms: 0..=0,
            click_ms: 0..=0,
            keystroke_ms: 0..=0,
        }
    }

    pub async fn before_navigation(&self) {
        pause(&self.navigation_ms).await
    }

    pub async fn before_click(&self) {
        pause(&self.click_ms).await
    }

    /// Send `text` one character at a time.
    pub async fn type_into(&self, element: &Element, text: &str) -> Result<()> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element.send_keys(ch.encode_utf8(&mut buf)).await?;
            pause(&self.keystroke_ms).await;
        }
        Ok(())
    }
}

async fn pause(range: &RangeInclusive<u64>) {
    let (lo, hi) = (*range.start(), *range.end());
    if hi == 0 {
        return;
    }
    let ms = OsRng.gen_range(lo..=hi.max(lo));
    sleep(Duration::from_millis(ms)).await;
}
