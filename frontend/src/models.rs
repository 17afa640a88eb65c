//! Typed views of the backend's JSON answers. Every displayed field is
//! optional; numbers that arrive as anything but a JSON number read as absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

/// Allocation-style maps (`{"Equity": 40.0, ...}`) in backend order.
pub fn numeric_entries(map: &Map<String, Value>) -> Vec<(String, Option<f64>)> {
    map.iter()
        .map(|(k, v)| (k.clone(), v.as_f64()))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentKind {
    FixedDeposits,
    Equity,
}

impl InvestmentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fixed_deposits" => Some(InvestmentKind::FixedDeposits),
            "equity" => Some(InvestmentKind::Equity),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            InvestmentKind::FixedDeposits => "Fixed Deposits",
            InvestmentKind::Equity => "Equity Markets",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InvestmentRequest {
    #[serde(rename = "type")]
    pub kind: InvestmentKind,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct InvestmentRow {
    #[serde(rename = "Subcategory", default, deserialize_with = "lenient_text")]
    pub subcategory: Option<String>,
    #[serde(rename = "Sector", default, deserialize_with = "lenient_text")]
    pub sector: Option<String>,
    #[serde(rename = "CAGR (%)", default, deserialize_with = "lenient_number")]
    pub cagr_percent: Option<f64>,
    #[serde(rename = "Volatility (%)", default, deserialize_with = "lenient_number")]
    pub volatility_percent: Option<f64>,
    #[serde(rename = "Risk_Level", default, deserialize_with = "lenient_text")]
    pub risk_level: Option<String>,
    #[serde(rename = "Liquidity_Level", default, deserialize_with = "lenient_number")]
    pub liquidity_level: Option<f64>,
}

impl InvestmentRow {
    pub fn category(&self) -> Option<&str> {
        self.subcategory.as_deref().or(self.sector.as_deref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct InvestmentAnalysis {
    #[serde(default)]
    pub data: Vec<InvestmentRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BudgetAnalysis {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub savings_rate_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub debt_ratio_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub discretionary_ratio_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommendations: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GoalProgress {
    #[serde(default, deserialize_with = "lenient_number")]
    pub monthly_required: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_savings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub progress_percent: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BudgetOptimization {
    #[serde(default)]
    pub optimized_budget: Map<String, Value>,
    #[serde(default)]
    pub analysis: BudgetAnalysis,
    #[serde(default)]
    pub goal_progress: Option<GoalProgress>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MonteCarlo {
    #[serde(default, deserialize_with = "lenient_number")]
    pub mean_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percentile_5: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percentile_95: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PortfolioResults {
    #[serde(default, deserialize_with = "lenient_number")]
    pub required_return_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub portfolio_cagr_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tax_adj_cagr_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub real_return_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub portfolio_volatility_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub portfolio_beta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub projected_nominal_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub projected_real_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub stress_test_percent: Option<f64>,
    #[serde(default)]
    pub asset_allocation: Map<String, Value>,
    #[serde(default)]
    pub monte_carlo_results: Option<MonteCarlo>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommendations: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PortfolioOptimization {
    #[serde(default)]
    pub results: PortfolioResults,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatbotAnswer {
    #[serde(default, deserialize_with = "lenient_text")]
    pub response: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub suggestions: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatbotQuestion<'a> {
    pub message: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginSession {
    pub token: String,
    #[serde(default)]
    pub user: Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SignupAccount {
    #[serde(default)]
    pub user: Value,
}
