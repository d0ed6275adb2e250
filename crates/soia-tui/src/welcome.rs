//! Welcome screen content shown before the first message.

pub const ASSISTANT_NAME: &str = "SOIA";
pub const ASSISTANT_TAGLINE: &str = "Consolida Capital assistant";
pub const GREETING: &str = "Hi! I'm SOIA";
pub const INTRO: &str = "Your Consolida Capital virtual assistant. I can help you with information about GNP products and services.";
pub const AUDIENCE: &str = "Exclusive for Consolida Capital agents";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamplePrompt {
    pub title: &'static str,
    pub question: &'static str,
}

pub const EXAMPLES: [ExamplePrompt; 4] = [
    ExamplePrompt {
        title: "Available products",
        question: "List all GNP insurance products",
    },
    ExamplePrompt {
        title: "Requirements",
        question: "What are the requirements to change the policyholder?",
    },
    ExamplePrompt {
        title: "Definitions",
        question: "What is coinsurance and when does it apply?",
    },
    ExamplePrompt {
        title: "Coverage",
        question: "What coverage applies to catastrophic illnesses?",
    },
];

pub const TOPICS: [&str; 4] = [
    "Product information",
    "Requirements and procedures",
    "Coverage and benefits",
    "Policy management",
];
