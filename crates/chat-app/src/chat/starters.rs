/// Starter prompts offered while the conversation is still empty.
pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "What are the best sensitivity settings for headshots?",
    "Tell me about the latest Free Fire tournament.",
    "Who is the best Free Fire player in the world right now?",
    "What are some popular games by Gameloft?",
];

pub fn example_prompt(index: usize) -> Option<&'static str> {
    EXAMPLE_PROMPTS.get(index).copied()
}
