//! Prompt builder for transaction analysis
//!
//! Produces a fixed system instruction describing the exact JSON shape the
//! model must return, plus a user prompt listing every transaction in input
//! order followed by a short numeric summary. Pure function of the request.

use std::fmt::Write;

use crate::models::{AnalysisRequest, DEFAULT_CURRENCY};

/// System instruction sent with every analysis request
pub const SYSTEM_PROMPT: &str = r#"You are FinoSpark AI, an expert financial and emotional intelligence analyst.
Your task is to analyze transaction data and provide insights in a specific JSON format.

IMPORTANT: You must ALWAYS respond with ONLY valid JSON, no other text before or after.

Your analysis should include:
1. Emotional tone detection (choose ONE: calm, stressed, anxious, excited, neutral)
2. Financial profile classification (choose ONE: spender, saver, balanced, investor)
3. Confidence score (0.0 to 1.0)
4. Top insights (2-4 key observations)
5. Three prioritized recommendations
6. A 30-day savings micro-plan

The JSON must follow this exact structure:
{
  "emotion": "calm|stressed|anxious|excited|neutral",
  "financial_profile": "spender|saver|balanced|investor",
  "confidence": 0.85,
  "top_insights": ["insight 1", "insight 2", "insight 3"],
  "recommendations": [
    {"title": "Recommendation Title", "desc": "Brief description", "priority": 1},
    {"title": "Second Recommendation", "desc": "Brief description", "priority": 2},
    {"title": "Third Recommendation", "desc": "Brief description", "priority": 3}
  ],
  "savings_plan": {
    "target_amount": 5000.0,
    "period_days": 30,
    "steps": ["Step 1", "Step 2", "Step 3"]
  }
}

Respond ONLY with valid JSON. No markdown, no explanations, just the JSON object."#;

/// System and user prompt for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Single-text form for providers without a separate system role
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Builds deterministic prompts from an analysis request
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(request: &AnalysisRequest) -> PromptPair {
        PromptPair {
            system: SYSTEM_PROMPT.to_string(),
            user: Self::user_prompt(request),
        }
    }

    /// Render the user prompt
    ///
    /// The summary uses the first transaction's currency. An empty list
    /// yields a zero average rather than dividing by zero.
    pub fn user_prompt(request: &AnalysisRequest) -> String {
        let transactions = &request.transactions;

        let lines = transactions
            .iter()
            .map(|t| {
                let mut line = format!(
                    "- {}: {} {:.2} at {} ({})",
                    t.date,
                    t.currency,
                    t.amount,
                    non_empty_or(&t.merchant, "Unknown"),
                    non_empty_or(&t.category, "Uncategorized"),
                );
                if !t.note.is_empty() {
                    let _ = write!(line, " - {}", t.note);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        let total: f64 = transactions.iter().map(|t| t.amount).sum();
        let average = if transactions.is_empty() {
            0.0
        } else {
            total / transactions.len() as f64
        };
        let currency = transactions
            .first()
            .map(|t| t.currency.as_str())
            .unwrap_or(DEFAULT_CURRENCY);

        let notes = request
            .notes
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("None provided");

        format!(
            "Analyze these financial transactions for user {user}:\n\n\
             TRANSACTIONS ({count} total):\n\
             {lines}\n\n\
             SUMMARY:\n\
             - Total spent: {currency} {total:.2}\n\
             - Average transaction: {currency} {average:.2}\n\n\
             ADDITIONAL NOTES:\n\
             {notes}\n\n\
             Provide your analysis in the required JSON format.",
            user = request.user_id,
            count = transactions.len(),
        )
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
