use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("structured output parse failed: {0}")]
    Parse(ParseDiagnostics),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic context for an unrecoverable extraction failure.
///
/// Carries enough to log-and-retry without persisting the full raw text:
/// total length plus bounded head/tail snippets (char-boundary safe).
#[derive(Debug, Clone, Serialize)]
pub struct ParseDiagnostics {
    pub raw_len: usize,
    pub head: String,
    pub tail: String,
}

impl ParseDiagnostics {
    pub fn from_raw(raw: &str) -> Self {
        const SNIPPET_CHARS: usize = 120;
        let head: String = raw.chars().take(SNIPPET_CHARS).collect();
        let tail_start = raw.chars().count().saturating_sub(SNIPPET_CHARS);
        let tail: String = raw.chars().skip(tail_start).collect();
        Self {
            raw_len: raw.len(),
            head,
            tail,
        }
    }
}

impl std::fmt::Display for ParseDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no JSON object recovered (raw_len={}, head={:?}, tail={:?})",
            self.raw_len, self.head, self.tail
        )
    }
}

/// Per-keyword density result: occurrence count plus percentage of total
/// document tokens, rounded half-up to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordDensity {
    pub count: u64,
    pub density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Body,
    Faq,
}

/// One entry of a caller-supplied document outline.
///
/// The outline exists before the text does, so sections carry word-count
/// bounds rather than actual text. FAQ entries are sections of kind `Faq`
/// with the question as the heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub heading: String,
    #[serde(default = "SectionKind::body")]
    pub kind: SectionKind,
    pub min_words: u64,
    pub max_words: u64,
    /// Lower is more important; `None` ranks after any `Some`, then
    /// document order breaks ties.
    #[serde(default)]
    pub priority: Option<u32>,
}

impl SectionKind {
    fn body() -> SectionKind {
        SectionKind::Body
    }
}

impl Section {
    /// Expected word count: midpoint of the outline's min/max bounds.
    pub fn weight(&self) -> u64 {
        (self.min_words + self.max_words) / 2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub total_words: u64,
    pub sections: Vec<Section>,
    pub keyword: String,
    /// Target keyword density in percent (e.g. 1.5 for 1.5%).
    pub target_density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    TitleMeta,
    Headings,
    Body,
    Faq,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::TitleMeta => "title_meta",
            Tier::Headings => "headings",
            Tier::Body => "body",
            Tier::Faq => "faq",
        }
    }
}

/// Where inside a section the assigned mentions go.
///
/// The first and last mention anchor at the section's first/last sentence
/// whenever two or more mentions are assigned; the rest spread across
/// middle paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MentionDistribution {
    pub first_sentence: u64,
    pub middle_paragraphs: u64,
    pub last_sentence: u64,
}

impl MentionDistribution {
    pub fn for_count(n: u64) -> Self {
        Self {
            first_sentence: n.min(1),
            last_sentence: n.saturating_sub(1).min(1),
            middle_paragraphs: n.saturating_sub(2),
        }
    }

    pub fn total(&self) -> u64 {
        self.first_sentence + self.middle_paragraphs + self.last_sentence
    }
}

/// One checklist entry: put `count` mentions into `slot`.
#[derive(Debug, Clone, Serialize)]
pub struct MentionTask {
    pub slot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub count: u64,
    pub distribution: MentionDistribution,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierAllocation {
    pub tier: Tier,
    pub total: u64,
    pub items: Vec<MentionTask>,
}

/// Keyword-mention budget for one keyword across the document's four
/// structural tiers. `total_allocated` stays within 3 of `total_target`
/// after reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct TaskAllocation {
    pub keyword: String,
    pub target_density: f64,
    pub total_target: u64,
    pub total_allocated: u64,
    pub tiers: Vec<TierAllocation>,
    pub warnings: Vec<&'static str>,
}

impl TaskAllocation {
    pub fn tier(&self, tier: Tier) -> Option<&TierAllocation> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySection {
    pub name: String,
    pub heading: String,
    pub content: String,
}

/// A generated article as the surrounding system hands it to the density
/// calculator: meta fields, intro, ordered body sections, FAQ entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleDocument {
    #[serde(default)]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub sections: Vec<BodySection>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

impl ArticleDocument {
    /// All textual fields joined in the fixed canonical order:
    /// meta title, meta description, meta keywords, intro, body sections
    /// (heading then content, document order), FAQ question/answer pairs.
    ///
    /// Densities are always computed over this concatenation, never per
    /// section.
    pub fn concatenated_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.push(&self.meta.title);
        parts.push(&self.meta.description);
        parts.push(&self.meta.keywords);
        parts.push(&self.intro);
        for s in &self.sections {
            parts.push(&s.heading);
            parts.push(&s.content);
        }
        for f in &self.faq {
            parts.push(&f.question);
            parts.push(&f.answer);
        }
        let mut out = String::new();
        for p in parts {
            if p.trim().is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(p);
        }
        out
    }
}
