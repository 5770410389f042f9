// src/narrative.rs

// --- Imports ---
use crate::normalize::title_case;

// --- Data Structures ---

/// Everything the narrative needs from a fully-computed record.
#[derive(Debug, Clone)]
pub struct NarrativeInput<'a> {
    pub holder_name: &'a str,
    pub company_name: &'a str,
    pub transaction_type: &'a str,
    pub amount: Option<i64>,
    pub holding_before: Option<i64>,
    pub holding_after: Option<i64>,
    pub purpose: &'a str,
}

// --- Generation ---

/// Human-friendly title/body with minimal grammar rules.
pub fn generate_title_and_body(input: &NarrativeInput) -> (String, String) {
    let holder = input.holder_name;
    let company = input.company_name;

    let (action_verb, title) = match input.transaction_type {
        "buy" => ("bought", format!("{} buys shares of {}", holder, company)),
        "sell" => ("sold", format!("{} sells shares of {}", holder, company)),
        "share-transfer" => (
            "transferred",
            format!("{} transfers shares of {}", holder, company),
        ),
        "award" => (
            "was awarded",
            format!("{} was awarded shares of {}", holder, company),
        ),
        "inheritance" => (
            "inherited",
            format!("{} inherits shares of {}", holder, company),
        ),
        "others" => (
            "executed a transaction for",
            format!("Change in {}'s position in {}", holder, company),
        ),
        other => {
            let action_title = title_case(&other.replace('-', " "));
            (
                "executed a transaction for",
                format!("{} {} transaction of {}", holder, action_title, company),
            )
        }
    };

    let amount_phrase = match input.amount {
        Some(amount) => format!("{} shares", group_thousands(amount)),
        None => "shares".to_string(),
    };

    let mut body = format!("{} {} {} of {}.", holder, action_verb, amount_phrase, company);

    if let (Some(before), Some(after)) = (input.holding_before, input.holding_after) {
        let before_str = group_thousands(before);
        let after_str = group_thousands(after);
        if after > before {
            body.push_str(&format!(
                " This increases their holdings from {} to {} shares.",
                before_str, after_str
            ));
        } else if after < before {
            body.push_str(&format!(
                " This decreases their holdings from {} to {} shares.",
                before_str, after_str
            ));
        } else {
            body.push_str(&format!(" Their holdings remain at {} shares.", after_str));
        }
    }

    if !input.purpose.is_empty() {
        body.push_str(&format!(
            " The stated purpose of the transaction was {}.",
            input.purpose.to_lowercase()
        ));
    }

    (title, body)
}

/// Formats an integer with "," thousands separators.
pub(crate) fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
