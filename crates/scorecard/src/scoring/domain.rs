use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for scoring sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for criteria within a template snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for criteria groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

/// Aggregation strategy declared by the evaluation template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Weighted,
    SimpleAverage,
    PassFail,
    Points,
    CustomFormula,
}

impl ScoringMethod {
    pub const fn label(self) -> &'static str {
        match self {
            ScoringMethod::Weighted => "weighted",
            ScoringMethod::SimpleAverage => "simple_average",
            ScoringMethod::PassFail => "pass_fail",
            ScoringMethod::Points => "points",
            ScoringMethod::CustomFormula => "custom_formula",
        }
    }
}

/// Template-declared formula backing the `custom_formula` method. The engine
/// never interprets the expression itself; callers register an evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFormula {
    pub name: String,
    pub expression: String,
}

/// Behavioral switches copied from the template into each session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub allow_not_applicable: bool,
    /// When set, scores normalizing below this value require a comment.
    pub require_comment_below: Option<f64>,
    pub allow_partial_submission: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            allow_not_applicable: true,
            require_comment_below: None,
            allow_partial_submission: false,
        }
    }
}

/// Named bucket of criteria with an optional weight for group-level folding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub is_required: bool,
}

/// One selectable option for a multiple-choice criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub score: f64,
}

/// Display band for percentage criteria (e.g., 80 → green, 60 → amber). The
/// engine never branches on these; they ride along for callers to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub floor: f64,
    pub color: String,
}

/// Per-type configuration for a criterion, tagged so evaluation can match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaConfig {
    Boolean,
    Scale {
        min: f64,
        max: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Percentage {
        #[serde(default)]
        thresholds: Vec<ColorBand>,
    },
    MultipleChoice {
        choices: Vec<ChoiceOption>,
    },
    Text,
}

impl CriteriaConfig {
    pub const fn type_label(&self) -> &'static str {
        match self {
            CriteriaConfig::Boolean => "boolean",
            CriteriaConfig::Scale { .. } => "scale",
            CriteriaConfig::Percentage { .. } => "percentage",
            CriteriaConfig::MultipleChoice { .. } => "multiple_choice",
            CriteriaConfig::Text => "text",
        }
    }

    /// Display helper: the color band a percentage value falls into, taking
    /// the highest floor at or under the value.
    pub fn color_for(&self, value: f64) -> Option<&str> {
        match self {
            CriteriaConfig::Percentage { thresholds } => thresholds
                .iter()
                .filter(|band| value >= band.floor)
                .max_by(|a, b| a.floor.total_cmp(&b.floor))
                .map(|band| band.color.as_str()),
            _ => None,
        }
    }
}

/// One evaluation criterion inside a template snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    pub config: CriteriaConfig,
    /// Relative contribution within the group or template.
    pub weight: f64,
    /// Maximum raw points, consumed by the `points` method.
    pub max_score: f64,
    pub is_required: bool,
    pub is_auto_fail: bool,
    /// Normalized score below which this criterion forces session failure.
    /// Falls back to the template pass threshold when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fail_threshold: Option<f64>,
    pub sort_order: i32,
}

impl Criterion {
    pub fn auto_fail_threshold_or(&self, template_pass_threshold: f64) -> f64 {
        self.auto_fail_threshold.unwrap_or(template_pass_threshold)
    }
}

/// Immutable copy of a template's scoring rules taken at session creation.
/// Later template edits never reach a session that already holds a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    pub template_id: String,
    pub name: String,
    pub scoring_method: ScoringMethod,
    /// Percentage required to pass, 0-100.
    pub pass_threshold: f64,
    pub max_total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_formula: Option<CustomFormula>,
    pub settings: TemplateSettings,
    #[serde(default)]
    pub groups: Vec<CriteriaGroup>,
    pub criteria: Vec<Criterion>,
}

impl TemplateSnapshot {
    pub fn criterion(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&CriteriaGroup> {
        self.groups.iter().find(|group| &group.id == id)
    }

    pub fn required_criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(|criterion| criterion.is_required)
    }
}

/// Raw judgment supplied by the scorer, tagged by criteria type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScoreValue {
    Boolean(bool),
    Scale(f64),
    Percentage(f64),
    Choice(String),
    Text(String),
}

impl ScoreValue {
    pub const fn type_label(&self) -> &'static str {
        match self {
            ScoreValue::Boolean(_) => "boolean",
            ScoreValue::Scale(_) => "scale",
            ScoreValue::Percentage(_) => "percentage",
            ScoreValue::Choice(_) => "multiple_choice",
            ScoreValue::Text(_) => "text",
        }
    }
}

/// One submitted judgment for one criterion within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub criteria_id: CriterionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ScoreValue>,
    #[serde(default)]
    pub is_na: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ScoreSubmission {
    pub fn scored(criteria_id: CriterionId, value: ScoreValue) -> Self {
        Self {
            criteria_id,
            value: Some(value),
            is_na: false,
            comment: None,
        }
    }

    pub fn not_applicable(criteria_id: CriterionId) -> Self {
        Self {
            criteria_id,
            value: None,
            is_na: true,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Computed fields for one evaluated criterion. All score fields are `None`
/// for not-applicable submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub raw_score: Option<f64>,
    pub normalized_score: Option<f64>,
    pub weighted_score: Option<f64>,
    pub is_auto_fail_triggered: bool,
}

impl CriterionResult {
    pub(crate) fn not_applicable() -> Self {
        Self {
            raw_score: None,
            normalized_score: None,
            weighted_score: None,
            is_auto_fail_triggered: false,
        }
    }

    pub fn is_na(&self) -> bool {
        self.normalized_score.is_none()
    }
}

/// A stored score: the submission the scorer sent plus the computed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub submission: ScoreSubmission,
    pub computed: CriterionResult,
    pub recorded_at: DateTime<Utc>,
}

/// Frozen output of aggregation plus verdict resolution for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScoreResult {
    pub total_score: f64,
    pub total_possible: f64,
    pub percentage_score: f64,
    pub pass_status: bool,
    pub has_auto_fail: bool,
    pub auto_fail_criteria_ids: Vec<CriterionId>,
}

/// Lifecycle states for a scoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}
