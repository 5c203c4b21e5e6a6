//! Splitting generated plan markdown into report sections

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static BLUF_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^##\s+(?:BLUF|Bottom\s+Line\s+Up\s+Front|Summary|Executive\s+Summary)")
        .expect("static regex")
});

static QUICK_WINS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^##\s+Low[- ]Hanging\s+Fruit").expect("static regex"));

static PLAN_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^##\s+(?:(?:Comprehensive|Detailed)\s+)?Action\s+Plan")
        .expect("static regex")
});

static ANY_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##\s+").expect("static regex"));

static QUICK_WIN_LINE: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)(?:Low[- ]Hanging\s+Fruit|Quick\s+Wins?|Easy\s+Wins?)")
            .expect("static regex"),
        Regex::new(r"(?i)(?:Immediate|Quick|Fast|Easy).*?(?:improvement|action|win)")
            .expect("static regex"),
    ]
});

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+\.|[-*])").expect("static regex"));

static PLAN_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)action\s+plan|comprehensive|detailed").expect("static regex"));

/// Report sections of a generated plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSections {
    /// Bottom line up front
    pub bluf: String,
    /// Quick wins
    pub low_hanging_fruit: String,
    /// Full plan; the whole text when nothing else was recognized
    pub action_plan: String,
    /// Whether a summary or quick-wins section was found
    pub has_sections: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Bluf,
    QuickWins,
    Plan,
}

fn section(heading: &Regex, text: &str, to_end: bool) -> Option<String> {
    let start = heading.find(text)?.end();
    let rest = &text[start..];
    let body = if to_end {
        rest
    } else {
        ANY_HEADING.find(rest).map_or(rest, |next| &rest[..next.start()])
    };
    Some(body.trim().to_string())
}

/// Guess sections of heading-less text from quick-win phrasing
fn split_by_phrases(text: &str) -> (String, String, String) {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut bucket = Bucket::Bluf;
    let mut buckets: [Vec<&str>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for (i, line) in lines.iter().enumerate() {
        if QUICK_WIN_LINE.iter().any(|re| re.is_match(line)) {
            bucket = Bucket::QuickWins;
        } else if bucket == Bucket::QuickWins
            && LIST_ITEM.is_match(line)
            && i > 5
            && i + 3 < lines.len()
            && PLAN_HINT.is_match(&lines[i..i + 3].join("\n"))
        {
            bucket = Bucket::Plan;
        }
        buckets[bucket as usize].push(line);
    }

    let [bluf, quick, plan] = buckets.map(|b| b.join("\n").trim().to_string());
    (bluf, quick, plan)
}

/// Split plan markdown by its `##` headings
///
/// Recognized headings are a summary (BLUF, Summary, Executive Summary), low
/// hanging fruit, and the action plan itself, which runs to the end of the
/// text. Without headings, quick-win phrasing is used to split; the action
/// plan falls back to the whole text.
#[must_use]
pub fn parse_action_plan(markdown: &str) -> PlanSections {
    if markdown.trim().is_empty() {
        return PlanSections::default();
    }
    let text = markdown.replace("\r\n", "\n").replace('\r', "\n");

    let bluf = section(&BLUF_HEADING, &text, false);
    let quick = section(&QUICK_WINS_HEADING, &text, false);
    let plan = section(&PLAN_HEADING, &text, true);
    let headed = bluf.is_some() || quick.is_some() || plan.is_some();

    let (bluf, quick, plan) = if headed {
        (
            bluf.unwrap_or_default(),
            quick.unwrap_or_default(),
            plan.unwrap_or_default(),
        )
    } else {
        split_by_phrases(&text)
    };

    let whole = text.trim().to_string();
    if bluf.is_empty() && quick.is_empty() && plan.is_empty() {
        return PlanSections {
            action_plan: whole,
            ..PlanSections::default()
        };
    }

    PlanSections {
        has_sections: !bluf.is_empty() || !quick.is_empty(),
        action_plan: if plan.is_empty() { whole } else { plan },
        bluf,
        low_hanging_fruit: quick,
    }
}
