use chrono::NaiveDate;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::db::{keys, LocalStore};
use crate::error::ClientResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub text: String,
    pub author: String,
}

const QUOTES: &[(&str, Option<&str>)] = &[
    ("It does not matter how slowly you go as long as you do not stop.", Some("Confucius")),
    ("The secret of getting ahead is getting started.", Some("Mark Twain")),
    ("Courage is not having the strength to go on; it is going on when you don't have the strength.", Some("Theodore Roosevelt")),
    ("Act as if what you do makes a difference. It does.", Some("William James")),
    ("Well done is better than well said.", Some("Benjamin Franklin")),
    ("What lies behind us and what lies before us are tiny matters compared to what lies within us.", Some("Ralph Waldo Emerson")),
    ("Believe you can and you're halfway there.", Some("Theodore Roosevelt")),
    ("A journey of a thousand miles begins with a single step.", Some("Lao Tzu")),
    ("Fall seven times, stand up eight.", None),
    ("Take care of your body. It's the only place you have to live.", Some("Jim Rohn")),
    ("Strength does not come from physical capacity. It comes from an indomitable will.", Some("Mahatma Gandhi")),
    ("Keep your face always toward the sunshine, and shadows will fall behind you.", Some("Walt Whitman")),
];

/// Date key in the same shape browsers print: `Wed May 01 2024`.
pub fn date_key(day: NaiveDate) -> String {
    day.format("%a %b %d %Y").to_string()
}

pub fn random_quote() -> DailyQuote {
    let (text, author) = QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or((QUOTES[0].0, QUOTES[0].1));
    DailyQuote {
        text: text.to_string(),
        author: author.unwrap_or("Unknown").to_string(),
    }
}

/// The quote for `today`: the stored one if it was picked today, otherwise a
/// fresh pick that is persisted for the rest of the day.
pub async fn daily_quote(store: &dyn LocalStore, today: NaiveDate) -> ClientResult<DailyQuote> {
    let today_key = date_key(today);
    let stored_date = store.get(keys::QUOTE_DATE).await?;

    if stored_date.as_deref() == Some(today_key.as_str()) {
        if let Some(raw) = store.get(keys::DAILY_QUOTE).await? {
            match serde_json::from_str::<DailyQuote>(&raw) {
                Ok(quote) => return Ok(quote),
                Err(e) => tracing::warn!("Discarding unreadable stored quote: {}", e),
            }
        }
    }

    let quote = random_quote();
    store
        .set(keys::DAILY_QUOTE, &serde_json::to_string(&quote)?)
        .await?;
    store.set(keys::QUOTE_DATE, &today_key).await?;
    Ok(quote)
}
