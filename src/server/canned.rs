//! Keyword-matched replies used by the mock endpoints and the offline backend.

use chrono::{DateTime, Local};

use crate::agent::providers::Usage;

/// The topics the mock agent recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Crypto,
    Weather,
    Time,
    Population,
}

impl Topic {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Topic::Crypto => "crypto_price",
            Topic::Weather => "get_weather",
            Topic::Time => "get_current_time",
            Topic::Population => "get_population",
        }
    }
}

const KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Crypto, &["bitcoin", "crypto"]),
    (Topic::Weather, &["weather", "temperature"]),
    (Topic::Time, &["time", "date"]),
    (Topic::Population, &["population"]),
];

pub const CRYPTO_REPLY: &str = "Based on current market data, Bitcoin is trading at approximately $87,000 with a market cap of around $1.7 trillion. The 24-hour trading volume is about $45 billion.";
pub const WEATHER_REPLY: &str = "I can help with weather information. Please specify which city you'd like weather information for. For example, 'What's the weather in London?'";
pub const POPULATION_REPLY: &str = "I can help with population information. Please specify which city you'd like population information for. For example, 'What's the population of Shanghai?'";

/// Case-insensitive match against the keyword table; the first topic wins.
pub fn classify(message: &str) -> Option<Topic> {
    let lower = message.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|word| lower.contains(word)))
        .map(|(topic, _)| *topic)
}

/// The canned reply for `message`, or a fallback that echoes it.
pub fn reply_for(message: &str, now: DateTime<Local>) -> String {
    match classify(message) {
        Some(Topic::Crypto) => CRYPTO_REPLY.to_string(),
        Some(Topic::Weather) => WEATHER_REPLY.to_string(),
        Some(Topic::Time) => format!(
            "The current time is {} and the date is {}. If you need time for a specific city, please specify which city.",
            now.format("%-I:%M:%S %p"),
            now.format("%-m/%-d/%Y"),
        ),
        Some(Topic::Population) => POPULATION_REPLY.to_string(),
        None => format!(
            "I received your message: \"{}\". In a real implementation, this would be processed by an AI agent that can interact with your Python backend services. The agent has access to tools for cryptocurrency prices, city information (weather, time, population, coordinates), and more.",
            message
        ),
    }
}

/// Rough token accounting by whitespace-separated words.
pub fn estimate_usage(prompt: &str, completion: &str) -> Usage {
    let prompt_tokens = prompt.split_whitespace().count() as u64;
    let completion_tokens = completion.split_whitespace().count() as u64;
    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn london_weather_gets_the_weather_prompt() {
        let reply = reply_for("What's the weather in London?", Local::now());
        assert_eq!(reply, WEATHER_REPLY);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify("BITCOIN to the moon"), Some(Topic::Crypto));
        assert_eq!(classify("Population of Tokyo"), Some(Topic::Population));
        assert_eq!(classify("what DATE is it"), Some(Topic::Time));
    }

    #[test]
    fn earlier_topics_take_precedence() {
        assert_eq!(classify("crypto weather"), Some(Topic::Crypto));
    }

    #[test]
    fn unmatched_input_is_echoed() {
        let reply = reply_for("Tell me a joke", Local::now());
        assert!(reply.starts_with("I received your message: \"Tell me a joke\"."));
        assert_eq!(classify("Tell me a joke"), None);
    }

    #[test]
    fn usage_counts_words() {
        let usage = estimate_usage("one two three", "four five");
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.completion_tokens, 2);
        assert_eq!(usage.total_tokens, 5);
    }
}
