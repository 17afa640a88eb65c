//! Offline answers used when neither chat backend is reachable.

/// Topic keyword to canned advice. Order matters: the first keyword found in
/// the message wins.
const TOPICS: [(&str, &str); 10] = [
    (
        "save money",
        "To save more money, try the 50/30/20 rule: 50% for needs, 30% for wants, 20% for savings. Also, automate your savings and track all expenses.",
    ),
    (
        "investment",
        "Good investment options include mutual funds, fixed deposits, government bonds, and gold ETFs. Your choice depends on risk tolerance and time horizon.",
    ),
    (
        "budget",
        "Create a budget by tracking income, categorizing expenses, setting spending limits, and reviewing monthly. Use our Budget Optimizer tool for detailed analysis.",
    ),
    (
        "emergency fund",
        "Aim for 3-6 months of expenses in your emergency fund. Start small and build gradually. Keep it in a separate, easily accessible account.",
    ),
    (
        "mutual fund",
        "Mutual funds are a great way to invest in the stock market with professional management. Consider index funds for lower fees and better returns.",
    ),
    (
        "tax",
        "Tax-saving investments include ELSS, PPF, and NPS. Consult a tax advisor for personalized advice based on your income bracket.",
    ),
    (
        "insurance",
        "Life insurance should cover 10-15 times your annual income. Health insurance is essential for medical emergencies.",
    ),
    (
        "retirement",
        "Start retirement planning early. Use our Investment Guide tool to create a personalized retirement strategy.",
    ),
    (
        "debt",
        "Focus on paying high-interest debt first (credit cards, personal loans). Consider debt consolidation for better rates.",
    ),
    (
        "credit score",
        "Maintain a good credit score by paying bills on time, keeping credit utilization low, and avoiding too many credit inquiries.",
    ),
];

const QUESTION_WORDS: [&str; 3] = ["how", "what", "why"];
const GREETINGS: [&str; 3] = ["hello", "hi", "hey"];

const QUESTION_REPLY: &str = "I'd be happy to help with your financial question. Could you please provide more specific details about what you'd like to know? You can also try asking about saving money, investments, budgeting, or insurance.";
const GREETING_REPLY: &str = "Hello! I'm your AI financial assistant. I can help you with questions about personal finance, investments, budgeting, and financial planning. What would you like to know?";
const GENERIC_REPLY: &str = "I understand you're asking about finances. For specific advice, try asking about topics like saving money, investments, budgeting, insurance, or retirement planning. How can I help you today?";

/// Plain substring matching on the lowercased message, so "this" counts as
/// a greeting and "whatever" as a question.
pub fn local_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let mentions = |word: &&str| lower.contains(*word);

    if let Some(reply) = TOPICS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, reply)| *reply)
    {
        return reply;
    }
    if QUESTION_WORDS.iter().any(mentions) {
        return QUESTION_REPLY;
    }
    if GREETINGS.iter().any(mentions) {
        return GREETING_REPLY;
    }
    GENERIC_REPLY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_keywords_map_to_their_advice() {
        for (keyword, reply) in TOPICS {
            let message = format!("Tell me about {}", keyword.to_uppercase());
            assert_eq!(local_reply(&message), reply, "{keyword}");
        }
    }

    #[test]
    fn first_listed_topic_wins() {
        // "investment" comes before "tax" in the table.
        assert_eq!(local_reply("tax on investment gains"), TOPICS[1].1);
        // "budget" before "debt".
        assert_eq!(local_reply("debt in my budget"), TOPICS[2].1);
    }

    #[test]
    fn heuristics_then_generic() {
        assert_eq!(local_reply("Why is gold rising?"), QUESTION_REPLY);
        assert_eq!(local_reply("hey there"), GREETING_REPLY);
        assert_eq!(local_reply("Stocks"), GENERIC_REPLY);
        assert_eq!(local_reply(""), GENERIC_REPLY);
    }

    #[test]
    fn question_words_beat_greetings() {
        assert_eq!(local_reply("hello, what now"), QUESTION_REPLY);
    }
}
