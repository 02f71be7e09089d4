//! Scenario replay against a rendered page.

use std::fs;
use std::time::Duration;

use anyhow::{Context as _, Result};
use product_detail::storefront_dom::{Event, EventKind};
use product_detail::Outcome;
use serde::Serialize;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::notification_badge;
use crate::scenario::{Scenario, Step};
use crate::session::{Session, SessionOptions, Shown};

#[derive(Debug, Serialize)]
struct StepReport {
    step: String,
    outcomes: Vec<String>,
    notifications: Vec<Shown>,
}

#[derive(Debug, Serialize)]
struct RequestReport {
    method: String,
    url: String,
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct ElementReport {
    selector: String,
    markup: Option<String>,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    mount: &'a product_detail::MountReport,
    steps: Vec<StepReport>,
    requests: Vec<RequestReport>,
    elements: Vec<ElementReport>,
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let page_path = ctx.resolve_path(&args.page);
    let markup = fs::read_to_string(&page_path)
        .with_context(|| format!("Failed to read page: {}", page_path.display()))?;
    let scenario = Scenario::load(&ctx.resolve_path(&args.scenario))?;

    let session = Session::open(
        &markup,
        &ctx.config,
        SessionOptions {
            cookies: &scenario.cookies,
            product_id: scenario.product_id.clone(),
            toast: scenario.toast,
        },
    )?;
    for response in &scenario.responses {
        session
            .transport
            .push(response.method()?, &response.path, response.reply()?);
    }

    ctx.output.header(&format!(
        "Simulating product {}",
        session.controller.context().product_id()
    ));

    let total = scenario.steps.len();
    let mut steps = Vec::with_capacity(total);
    for (i, step) in scenario.steps.iter().enumerate() {
        ctx.output.step(i + 1, total, &step.to_string());
        let seen = session.notifications().len();

        let outcomes = execute(&session, step)
            .await
            .with_context(|| format!("Step {} ({}) failed", i + 1, step))?;
        let notifications: Vec<Shown> = session.notifications().into_iter().skip(seen).collect();

        for outcome in &outcomes {
            ctx.output.list_item(&describe(outcome));
        }
        for shown in &notifications {
            ctx.output
                .list_item(&format!("{} {}", notification_badge(&shown.kind), shown.message));
        }

        steps.push(StepReport {
            step: step.to_string(),
            outcomes: outcomes.iter().map(describe).collect(),
            notifications,
        });
    }

    let requests: Vec<RequestReport> = session
        .transport
        .requests()
        .into_iter()
        .map(|r| RequestReport {
            method: r.method.to_string(),
            body: r.body_text().map(str::to_string),
            url: r.url,
        })
        .collect();

    let elements: Vec<ElementReport> = scenario
        .show
        .iter()
        .chain(args.show.iter())
        .map(|selector| {
            let page = session.page().borrow();
            let markup = page
                .query(selector)
                .ok()
                .flatten()
                .map(|node| page.outer_html(node));
            ElementReport {
                selector: selector.clone(),
                markup,
            }
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&SimulationReport {
            mount: &session.mount,
            steps,
            requests,
            elements,
        });
        return Ok(());
    }

    ctx.output.header("Requests");
    if requests.is_empty() {
        ctx.output.info("none");
    }
    for request in &requests {
        let body = request.body.as_deref().unwrap_or("");
        ctx.output
            .list_item(&format!("{} {} {}", request.method, request.url, body));
    }

    if !elements.is_empty() {
        ctx.output.header("Elements");
        for element in &elements {
            ctx.output.info(&element.selector);
            match &element.markup {
                Some(markup) => ctx.output.block(markup),
                None => ctx.output.warn(&format!("No element matches {}", element.selector)),
            }
        }
    }

    ctx.output.success(&format!("{} step(s) replayed", total));
    Ok(())
}

async fn execute(session: &Session, step: &Step) -> Result<Vec<Outcome>> {
    let controller = &session.controller;
    let outcomes = match step {
        Step::SetValue { selector, value } => {
            let node = session.node(selector)?;
            session.page().borrow_mut().set_value(node, value.as_str());
            Vec::new()
        }
        Step::Check { selector } => {
            let node = session.node(selector)?;
            session.page().borrow_mut().set_checked(node, true);
            controller.dispatch(Event::change(node)).await.outcomes
        }
        Step::Click { selector } => {
            let node = session.node(selector)?;
            controller.dispatch(Event::click(node)).await.outcomes
        }
        Step::Submit { selector } => {
            let node = session.node(selector)?;
            controller.dispatch(Event::submit(node)).await.outcomes
        }
        Step::Hover { selector, on } => {
            let node = session.node(selector)?;
            session.toolkit.set_hovered(node, *on);
            let kind = if *on {
                EventKind::MouseEnter
            } else {
                EventKind::MouseLeave
            };
            controller.dispatch(Event::new(kind, node)).await.outcomes
        }
        Step::Advance { ms } => {
            let dt = Duration::from_millis(*ms);
            let transitions = session
                .toolkit
                .tick(&mut session.page().borrow_mut(), dt);
            let callbacks = session.scheduler.advance(dt);
            tracing::debug!(transitions, callbacks, "Time advanced");
            Vec::new()
        }
        Step::ModalHidden { selector } => {
            let node = session.node(selector)?;
            let hidden = session
                .toolkit
                .hide_modal(&mut session.page().borrow_mut(), node);
            if hidden {
                controller
                    .dispatch(Event::new(EventKind::ModalHidden, node))
                    .await
                    .outcomes
            } else {
                Vec::new()
            }
        }
    };
    Ok(outcomes)
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::ImageSwitched { index } => format!("image switched to slide {index}"),
        Outcome::ModalShown { src } => format!("zoom modal shows {src}"),
        Outcome::ModalClosed => "zoom modal closed".to_string(),
        Outcome::RatingSynced(rating) => format!("rating shown as {rating}"),
        Outcome::AddedToCart {
            product_id,
            cart_count,
        } => match cart_count {
            Some(count) => format!("product {product_id} added to cart ({count} in cart)"),
            None => format!("product {product_id} added to cart"),
        },
        Outcome::FavoriteToggled {
            product_id, action, ..
        } => format!("product {product_id} favorite {action:?}"),
        Outcome::Ignored => "ignored".to_string(),
        Outcome::Failed(e) => format!("failed: {e}"),
    }
}
