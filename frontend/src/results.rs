//! Backend analysis results rendered into the tools section. Each category
//! keeps at most one block on the page; a new result replaces the old one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

use serde_json::{Map, Value};
use wasm_bindgen_futures::spawn_local;
use web_sys::Event;
use yew::prelude::*;
use yew::html::BaseComponent;

use crate::api::BackendReply;
use crate::config::{BUDGET_ENDPOINT, INVESTMENT_ENDPOINT, PORTFOLIO_ENDPOINT, RESULTS_SECTION};
use crate::dom::{listen, query_in, SharedContext};
use crate::format::{bar_width, currency, fixed, percent, text};
use crate::forms::{claim, collect_fields, form_payload, restore_busy, set_busy, validate_required, FormError};
use crate::models::{
    numeric_entries, BudgetAnalysis, BudgetOptimization, GoalProgress, InvestmentAnalysis, InvestmentKind,
    InvestmentRequest, InvestmentRow, PortfolioOptimization, PortfolioResults,
};
use crate::notify::ToastKind;

const INVESTMENT_CLASS: &str = "investment-results";
const BUDGET_CLASS: &str = "budget-results";
const PORTFOLIO_CLASS: &str = "portfolio-results";

/// `label: value` line of a summary block.
#[derive(Clone, Debug, PartialEq)]
pub struct Stat {
    pub label: &'static str,
    pub value: String,
}

fn stat(label: &'static str, value: String) -> Stat {
    Stat { label, value }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: String,
    pub width: f64,
}

pub fn investment_cells(row: &InvestmentRow) -> [String; 5] {
    [
        text(row.category()),
        fixed(row.cagr_percent, 2),
        fixed(row.volatility_percent, 2),
        text(row.risk_level.as_deref()),
        fixed(row.liquidity_level, 2),
    ]
}

pub fn budget_summary(analysis: &BudgetAnalysis) -> Vec<Stat> {
    let mut stats = vec![
        stat("Total Income", currency(analysis.total_income)),
        stat("Savings Rate", percent(analysis.savings_rate_percent, 1)),
        stat("Debt Ratio", percent(analysis.debt_ratio_percent, 1)),
    ];
    if analysis.discretionary_ratio_percent.is_some() {
        stats.push(stat(
            "Discretionary Spending",
            percent(analysis.discretionary_ratio_percent, 1),
        ));
    }
    stats
}

/// Budget lines sized against total income.
pub fn budget_bars(budget: &Map<String, Value>, total_income: Option<f64>) -> Vec<Bar> {
    numeric_entries(budget)
        .into_iter()
        .map(|(label, amount)| Bar {
            value: currency(amount),
            width: bar_width(amount, total_income),
            label,
        })
        .collect()
}

pub fn goal_summary(goal: &GoalProgress) -> Vec<Stat> {
    vec![
        stat("Monthly Required", currency(goal.monthly_required)),
        stat("Current Savings", currency(goal.current_savings)),
        stat("Status", text(goal.status.as_deref())),
        stat("Progress", percent(goal.progress_percent, 1)),
    ]
}

pub fn portfolio_summary(results: &PortfolioResults) -> Vec<Stat> {
    let mut stats = vec![
        stat("Required Return", percent(results.required_return_percent, 2)),
        stat("Expected CAGR", percent(results.portfolio_cagr_percent, 2)),
    ];
    if results.tax_adj_cagr_percent.is_some() {
        stats.push(stat("Tax-adjusted CAGR", percent(results.tax_adj_cagr_percent, 2)));
    }
    if results.real_return_percent.is_some() {
        stats.push(stat("Real Return", percent(results.real_return_percent, 2)));
    }
    stats.push(stat(
        "Portfolio Volatility",
        percent(results.portfolio_volatility_percent, 2),
    ));
    if results.portfolio_beta.is_some() {
        stats.push(stat("Portfolio Beta", fixed(results.portfolio_beta, 2)));
    }
    stats
}

/// Allocation percentages; the bar width is the percentage itself.
pub fn allocation_bars(allocation: &Map<String, Value>) -> Vec<Bar> {
    numeric_entries(allocation)
        .into_iter()
        .map(|(label, share)| Bar {
            value: percent(share, 1),
            width: bar_width(share, Some(100.0)),
            label,
        })
        .collect()
}

pub fn portfolio_projections(results: &PortfolioResults) -> Vec<Stat> {
    let mut stats = vec![stat("Projected Value", currency(results.projected_nominal_value))];
    if results.projected_real_value.is_some() {
        stats.push(stat("Projected Real Value", currency(results.projected_real_value)));
    }
    stats.push(stat("Stress Test Impact", percent(results.stress_test_percent, 1)));
    if let Some(mc) = &results.monte_carlo_results {
        stats.push(stat("Simulated Mean Value", currency(mc.mean_value)));
        stats.push(stat("5th Percentile", currency(mc.percentile_5)));
        stats.push(stat("95th Percentile", currency(mc.percentile_95)));
    }
    stats
}

fn stat_rows(stats: Vec<Stat>, item_class: &'static str) -> Html {
    html! {
        <>
            { for stats.into_iter().map(|s| html! {
                <div class={item_class}>
                    <span class="label">{ format!("{}:", s.label) }</span>
                    <span class="value">{ s.value }</span>
                </div>
            }) }
        </>
    }
}

fn bar_rows(bars: Vec<Bar>, item_class: &'static str, label_class: &'static str, value_class: &'static str) -> Html {
    html! {
        <>
            { for bars.into_iter().map(|bar| html! {
                <div class={item_class}>
                    <span class={label_class}>{ bar.label }</span>
                    <span class={value_class}>{ bar.value }</span>
                    <div class="bar" style={format!("width: {}%", bar.width)}></div>
                </div>
            }) }
        </>
    }
}

fn recommendations(items: &[String]) -> Html {
    html! {
        <div class="recommendations">
            <h4>{"Recommendations"}</h4>
            <ul>
                { for items.iter().map(|rec| html! { <li>{ rec.clone() }</li> }) }
            </ul>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct InvestmentResultsProps {
    pub kind: InvestmentKind,
    pub rows: Vec<InvestmentRow>,
}

#[function_component(InvestmentResults)]
pub fn investment_results(props: &InvestmentResultsProps) -> Html {
    html! {
        <>
            <h3>{ format!("{} Analysis Results", props.kind.title()) }</h3>
            <div class="results-table">
                <table>
                    <thead>
                        <tr>
                            <th>{"Category"}</th>
                            <th>{"CAGR (%)"}</th>
                            <th>{"Volatility (%)"}</th>
                            <th>{"Risk Level"}</th>
                            <th>{"Liquidity"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for props.rows.iter().map(|row| html! {
                            <tr>
                                { for investment_cells(row).into_iter().map(|cell| html! { <td>{ cell }</td> }) }
                            </tr>
                        }) }
                    </tbody>
                </table>
            </div>
        </>
    }
}

#[derive(Properties, PartialEq)]
pub struct BudgetResultsProps {
    pub result: BudgetOptimization,
}

#[function_component(BudgetResults)]
pub fn budget_results(props: &BudgetResultsProps) -> Html {
    let analysis = &props.result.analysis;
    html! {
        <>
            <h3>{"Budget Optimization Results"}</h3>
            <div class="budget-summary">
                { stat_rows(budget_summary(analysis), "summary-item") }
            </div>
            <div class="budget-breakdown">
                <h4>{"Optimized Budget Allocation"}</h4>
                <div class="budget-chart">
                    { bar_rows(budget_bars(&props.result.optimized_budget, analysis.total_income), "budget-item", "category", "amount") }
                </div>
            </div>
            {
                match &props.result.goal_progress {
                    Some(goal) => html! {
                        <div class="goal-progress">
                            <h4>{"Goal Progress"}</h4>
                            { stat_rows(goal_summary(goal), "summary-item") }
                        </div>
                    },
                    None => html! {},
                }
            }
            { recommendations(&analysis.recommendations) }
        </>
    }
}

#[derive(Properties, PartialEq)]
pub struct PortfolioResultsViewProps {
    pub results: PortfolioResults,
}

#[function_component(PortfolioResultsView)]
pub fn portfolio_results_view(props: &PortfolioResultsViewProps) -> Html {
    let results = &props.results;
    html! {
        <>
            <h3>{"Portfolio Optimization Results"}</h3>
            <div class="portfolio-summary">
                { stat_rows(portfolio_summary(results), "summary-item") }
            </div>
            <div class="asset-allocation">
                <h4>{"Asset Allocation"}</h4>
                <div class="allocation-chart">
                    { bar_rows(allocation_bars(&results.asset_allocation), "allocation-item", "asset", "allocation") }
                </div>
            </div>
            <div class="projections">
                <h4>{"Projections"}</h4>
                { stat_rows(portfolio_projections(results), "projection-item") }
            </div>
            { recommendations(&results.recommendations) }
        </>
    }
}

type Teardown = Box<dyn FnOnce()>;

/// The mounted result app of each block class, kept so a replacement can
/// destroy the previous app before its host element goes away.
#[derive(Default)]
pub struct ResultSlots {
    mounted: RefCell<HashMap<&'static str, Teardown>>,
}

impl ResultSlots {
    fn insert(&self, class: &'static str, teardown: Teardown) {
        self.mounted.borrow_mut().insert(class, teardown);
    }

    fn take(&self, class: &'static str) -> Option<Teardown> {
        self.mounted.borrow_mut().remove(class)
    }
}

/// Replaces any previous block of `class` in the results section with a
/// freshly rendered `C`.
fn mount_result<C>(ctx: &SharedContext, class: &'static str, props: C::Properties)
where
    C: BaseComponent,
{
    let Some(section) = ctx.query(RESULTS_SECTION) else {
        log::warn!("No {} section to show results in", RESULTS_SECTION);
        return;
    };
    if let Some(teardown) = ctx.results.take(class) {
        teardown();
    }
    if let Some(previous) = query_in(&section, &format!(".{}", class)) {
        previous.remove();
    }
    let Ok(host) = ctx.document.create_element("div") else {
        return;
    };
    host.set_class_name(class);
    if section.append_child(&host).is_err() {
        return;
    }
    let app = yew::Renderer::<C>::with_root_and_props(host, props).render();
    ctx.results.insert(class, Box::new(move || app.destroy()));
}

fn failure_prefix(kind: InvestmentKind) -> &'static str {
    match kind {
        InvestmentKind::FixedDeposits => "Error analyzing fixed deposits",
        InvestmentKind::Equity => "Error analyzing equity markets",
    }
}

fn show_failure(ctx: &SharedContext, prefix: &str, reason: impl std::fmt::Display) {
    ctx.notifier
        .show(format!("{}: {}", prefix, reason), ToastKind::Error);
}

fn report_unsuccessful(ctx: &SharedContext, prefix: &str, error: Option<String>) {
    match error {
        Some(error) => show_failure(ctx, prefix, error),
        None => log::warn!("{}: backend reported no success", prefix),
    }
}

pub async fn analyze_investment(ctx: SharedContext, kind: InvestmentKind) {
    let reply = ctx
        .api
        .post_reply::<_, InvestmentAnalysis>(INVESTMENT_ENDPOINT, &InvestmentRequest { kind })
        .await;
    match reply {
        Ok(BackendReply::Success(analysis)) => mount_result::<InvestmentResults>(
            &ctx,
            INVESTMENT_CLASS,
            InvestmentResultsProps {
                kind,
                rows: analysis.data,
            },
        ),
        Ok(BackendReply::Failure { error }) => report_unsuccessful(&ctx, failure_prefix(kind), error),
        Err(err) => show_failure(&ctx, failure_prefix(kind), err),
    }
}

pub async fn optimize_budget(ctx: SharedContext, payload: Map<String, Value>) {
    const PREFIX: &str = "Error optimizing budget";
    match ctx
        .api
        .post_reply::<_, BudgetOptimization>(BUDGET_ENDPOINT, &payload)
        .await
    {
        Ok(BackendReply::Success(result)) => {
            mount_result::<BudgetResults>(&ctx, BUDGET_CLASS, BudgetResultsProps { result })
        }
        Ok(BackendReply::Failure { error }) => report_unsuccessful(&ctx, PREFIX, error),
        Err(err) => show_failure(&ctx, PREFIX, err),
    }
}

pub async fn optimize_portfolio(ctx: SharedContext, payload: Map<String, Value>) {
    const PREFIX: &str = "Error optimizing portfolio";
    match ctx
        .api
        .post_reply::<_, PortfolioOptimization>(PORTFOLIO_ENDPOINT, &payload)
        .await
    {
        Ok(BackendReply::Success(optimization)) => mount_result::<PortfolioResultsView>(
            &ctx,
            PORTFOLIO_CLASS,
            PortfolioResultsViewProps {
                results: optimization.results,
            },
        ),
        Ok(BackendReply::Failure { error }) => report_unsuccessful(&ctx, PREFIX, error),
        Err(err) => show_failure(&ctx, PREFIX, err),
    }
}

pub fn attach(ctx: &SharedContext) {
    for button in ctx.query_all("[data-analyze]") {
        let Some(kind) = button
            .get_attribute("data-analyze")
            .and_then(|raw| InvestmentKind::parse(&raw))
        else {
            log::warn!("Unknown data-analyze value on {}", button.outer_html());
            continue;
        };
        let ctx = ctx.clone();
        listen(&button, "click", move |event: Event| {
            event.prevent_default();
            spawn_local(analyze_investment(ctx.clone(), kind));
        });
    }

    attach_tool_form(ctx, "budgetForm", optimize_budget);
    attach_tool_form(ctx, "portfolioForm", optimize_portfolio);
}

fn attach_tool_form<F, Fut>(ctx: &SharedContext, id: &str, submit: F)
where
    F: Fn(SharedContext, Map<String, Value>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let Some(form) = ctx.by_id(id) else {
        return;
    };
    claim(&form);

    let ctx = ctx.clone();
    let target = form.clone();
    listen(&form, "submit", move |event: Event| {
        event.prevent_default();
        if !validate_required(&target) {
            ctx.notifier
                .show(FormError::MissingRequired.to_string(), ToastKind::Error);
            return;
        }

        let payload = form_payload(collect_fields(&target));
        let busy = set_busy(&target, "Optimizing...");
        let request = submit(ctx.clone(), payload);
        spawn_local(async move {
            request.await;
            if let Some((button, original)) = busy {
                restore_busy(&button, &original);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn replacing_a_result_tears_down_only_that_block() {
        let slots = ResultSlots::default();
        let destroyed = Rc::new(Cell::new(0));
        let counter = destroyed.clone();
        slots.insert(BUDGET_CLASS, Box::new(move || counter.set(counter.get() + 1)));

        assert!(slots.take(PORTFOLIO_CLASS).is_none());
        if let Some(teardown) = slots.take(BUDGET_CLASS) {
            teardown();
        }
        assert_eq!(destroyed.get(), 1);
        assert!(slots.take(BUDGET_CLASS).is_none());
    }

    #[test]
    fn investment_row_prefers_subcategory_and_formats_two_places() {
        let row: InvestmentRow = serde_json::from_value(json!({
            "Subcategory": "Large Cap",
            "Sector": "Banking",
            "CAGR (%)": 12.345,
            "Volatility (%)": 18.0,
            "Risk_Level": "High",
            "Liquidity_Level": 3
        }))
        .unwrap();
        assert_eq!(investment_cells(&row), ["Large Cap", "12.35", "18.00", "High", "3.00"]);
    }

    #[test]
    fn missing_investment_fields_render_na() {
        let row: InvestmentRow = serde_json::from_value(json!({"Sector": "IT", "CAGR (%)": "fast"})).unwrap();
        assert_eq!(investment_cells(&row), ["IT", "N/A", "N/A", "N/A", "N/A"]);
        assert_eq!(investment_cells(&InvestmentRow::default())[0], "N/A");
    }

    #[test]
    fn budget_view() {
        let result: BudgetOptimization = serde_json::from_value(json!({
            "success": true,
            "optimized_budget": {"Rent": 15000, "Savings": 10000, "Fun": "lots"},
            "analysis": {
                "total_income": 50000,
                "savings_rate_percent": 20.04,
                "debt_ratio_percent": 12.5,
                "recommendations": ["Cut dining out"]
            }
        }))
        .unwrap();

        let summary = budget_summary(&result.analysis);
        assert_eq!(summary[0], stat("Total Income", "₹50,000".into()));
        assert_eq!(summary[1].value, "20.0%");
        assert_eq!(summary[2].value, "12.5%");
        assert_eq!(summary.len(), 3);

        let bars = budget_bars(&result.optimized_budget, result.analysis.total_income);
        assert_eq!(bars.iter().map(|b| b.label.as_str()).collect::<Vec<_>>(), ["Rent", "Savings", "Fun"]);
        assert_eq!(bars[0].value, "₹15,000");
        assert!((bars[0].width - 30.0).abs() < 1e-9);
        assert_eq!(bars[2].value, "N/A");
        assert_eq!(bars[2].width, 0.0);
    }

    #[test]
    fn budget_without_income_has_flat_bars() {
        let bars = budget_bars(&json!({"Rent": 100}).as_object().unwrap().clone(), None);
        assert_eq!(bars[0].width, 0.0);
        assert_eq!(budget_summary(&BudgetAnalysis::default())[0].value, "N/A");
    }

    #[test]
    fn goal_progress_view() {
        let goal = GoalProgress {
            monthly_required: Some(8333.4),
            current_savings: None,
            status: Some("On Track".into()),
            progress_percent: Some(41.26),
        };
        let values: Vec<String> = goal_summary(&goal).into_iter().map(|s| s.value).collect();
        assert_eq!(values, ["₹8,333", "N/A", "On Track", "41.3%"]);
    }

    #[test]
    fn portfolio_view_shows_optional_lines_only_when_present() {
        let results: PortfolioResults = serde_json::from_value(json!({
            "required_return_percent": 10.0,
            "portfolio_cagr_percent": 11.456,
            "portfolio_volatility_percent": 14.2,
            "asset_allocation": {"Equity": 60.0, "Debt": 30.04, "Gold": 140},
            "projected_nominal_value": 2500000.4,
            "stress_test_percent": -22.36,
            "recommendations": []
        }))
        .unwrap();

        let labels: Vec<&str> = portfolio_summary(&results).iter().map(|s| s.label).collect();
        assert_eq!(labels, ["Required Return", "Expected CAGR", "Portfolio Volatility"]);
        assert_eq!(portfolio_summary(&results)[1].value, "11.46%");

        let bars = allocation_bars(&results.asset_allocation);
        assert_eq!(bars[1].value, "30.0%");
        assert_eq!(bars[2].width, 100.0);

        let projections = portfolio_projections(&results);
        assert_eq!(projections[0].value, "₹2,500,000");
        assert_eq!(projections[1], stat("Stress Test Impact", "-22.4%".into()));
        assert_eq!(projections.len(), 2);
    }

    #[test]
    fn monte_carlo_lines() {
        let results: PortfolioResults = serde_json::from_value(json!({
            "portfolio_beta": 0.87,
            "monte_carlo_results": {"mean_value": 1000, "percentile_5": null, "percentile_95": 2000}
        }))
        .unwrap();
        assert_eq!(portfolio_summary(&results).last().map(|s| s.value.as_str()), Some("0.87"));
        let projections = portfolio_projections(&results);
        assert_eq!(projections.len(), 5);
        assert_eq!(projections[3].value, "N/A");
        assert_eq!(projections[4].value, "₹2,000");
    }
}
