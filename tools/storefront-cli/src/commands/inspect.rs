//! Page inspection against the controller's DOM contract.

use std::fs;

use anyhow::{bail, Context as _, Result};
use product_detail::storefront_dom::{NodeId, Page, Selector};
use product_detail::storefront_widgets::slides;
use product_detail::{
    star_labels, PdpConfig, ProductId, CART_BUTTON_CLASS, CART_COUNT_CLASS, CART_FORM_CLASS,
    FAVORITE_BUTTON_CLASS, FAVORITE_COUNT_CLASS, RATING_INPUT_SELECTOR, STAR_COUNT,
};
use serde::Serialize;

use super::InspectArgs;
use crate::context::Context;
use crate::session::{Session, SessionOptions};

/// One contract check.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    /// Whether a failure breaks a surface rather than just skipping it.
    pub required: bool,
    pub detail: String,
}

impl Check {
    fn new(name: impl Into<String>, ok: bool, required: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok,
            required,
            detail: detail.into(),
        }
    }
}

#[derive(Serialize)]
struct InspectReport<'a> {
    mount: &'a product_detail::MountReport,
    checks: &'a [Check],
}

/// Run the inspect command.
pub async fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.page);
    let markup = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read page: {}", path.display()))?;

    let session = Session::open(
        &markup,
        &ctx.config,
        SessionOptions {
            cookies: "",
            product_id: args.product_id,
            toast: true,
        },
    )?;
    let product_id = session.controller.context().product_id().clone();
    let checks = check_contract(&session.page().borrow(), &product_id, &ctx.config);

    if ctx.output.is_json() {
        ctx.output.json(&InspectReport {
            mount: &session.mount,
            checks: &checks,
        });
    } else {
        let mount = &session.mount;
        ctx.output.header(&format!("Product {}", product_id));
        ctx.output.kv("main carousel", &mount.main_carousel.to_string());
        ctx.output.kv("recommended carousel", &mount.recommended_carousel.to_string());
        ctx.output.kv("thumbnails", &mount.thumbnails.to_string());
        ctx.output.kv("zoom triggers", &mount.zoom_triggers.to_string());
        ctx.output.kv("rating inputs", &mount.rating_inputs.to_string());
        ctx.output.kv("cart forms", &mount.cart_forms.to_string());
        ctx.output.kv("favorite buttons", &mount.favorite_buttons.to_string());

        ctx.output.header("DOM contract");
        for check in &checks {
            ctx.output.check(check.ok, &check.name, &check.detail);
        }
    }

    let broken = checks.iter().filter(|c| c.required && !c.ok).count();
    if broken > 0 {
        bail!("{} required element(s) missing or malformed", broken);
    }
    if !ctx.output.is_json() {
        ctx.output.success("Page satisfies the controller contract");
    }
    Ok(())
}

/// Check every element the controller reads.
pub fn check_contract(page: &Page, product_id: &ProductId, config: &PdpConfig) -> Vec<Check> {
    let mut checks = Vec::new();
    let carousel = &config.carousel;
    let document = page.document();

    let main_id = carousel.main_id(product_id);
    match page.get_element_by_id(&main_id) {
        Some(root) => {
            let slide_count = slides(page, root).len();
            checks.push(Check::new(
                format!("#{main_id}"),
                slide_count > 0,
                true,
                format!("{slide_count} slide(s)"),
            ));
            let thumbnails = page.select_all(root, &Selector::class("thumbnail"));
            let wired = thumbnails
                .iter()
                .filter(|&&t| page.has_attr(t, "data-slide-to"))
                .count();
            checks.push(Check::new(
                "thumbnails",
                wired == thumbnails.len(),
                false,
                format!("{wired}/{} with data-slide-to", thumbnails.len()),
            ));
        }
        None => checks.push(Check::new(format!("#{main_id}"), false, true, "not found")),
    }

    let recommended = page.get_element_by_id(&carousel.recommended_id).is_some();
    checks.push(Check::new(
        format!("#{}", carousel.recommended_id),
        recommended,
        false,
        if recommended { "" } else { "absent, not mounted" },
    ));

    let modal = page.get_element_by_id(&carousel.modal_id).is_some();
    let modal_image = page.get_element_by_id(&carousel.modal_image_id).is_some();
    checks.push(Check::new(
        format!("#{}", carousel.modal_id),
        modal && modal_image,
        false,
        match (modal, modal_image) {
            (true, true) => String::new(),
            (true, false) => format!("#{} missing", carousel.modal_image_id),
            _ => "absent, zoom disabled".to_string(),
        },
    ));

    let inputs = page.query_all(RATING_INPUT_SELECTOR).unwrap_or_default();
    let stars = star_labels(page);
    let with_icon = stars
        .iter()
        .filter(|&&s| page.select(s, &Selector::tag("i")).is_some())
        .count();
    if !inputs.is_empty() || !stars.is_empty() {
        checks.push(Check::new(
            "rating",
            with_icon == usize::from(STAR_COUNT),
            true,
            format!("{} input(s), {with_icon}/{} star icon(s)", inputs.len(), STAR_COUNT),
        ));
    }

    for (i, form) in page
        .select_all(document, &Selector::class(CART_FORM_CLASS))
        .into_iter()
        .enumerate()
    {
        checks.push(check_cart_form(page, form, i, config));
    }

    for (i, button) in page
        .select_all(document, &Selector::class(FAVORITE_BUTTON_CLASS))
        .into_iter()
        .enumerate()
    {
        checks.push(check_favorite_button(page, button, i));
    }

    for class in [CART_COUNT_CLASS, FAVORITE_COUNT_CLASS] {
        let present = page.select(document, &Selector::class(class)).is_some();
        checks.push(Check::new(
            format!(".{class}"),
            present,
            false,
            if present { "" } else { "absent, count not shown" },
        ));
    }

    checks
}

fn check_cart_form(page: &Page, form: NodeId, index: usize, config: &PdpConfig) -> Check {
    let mut problems = Vec::new();
    match page.select(form, &Selector::class(CART_BUTTON_CLASS)) {
        Some(button) if page.has_attr(button, "data-product-id") => {}
        Some(_) => problems.push("button lacks data-product-id".to_string()),
        None => problems.push(format!("no .{CART_BUTTON_CLASS}")),
    }
    if page.query_in(form, "input[name=\"quantity\"]").ok().flatten().is_none() {
        problems.push("no quantity input".to_string());
    }
    let field = format!("input[name=\"{}\"]", config.csrf.form_field);
    if page.query_in(form, &field).ok().flatten().is_none() {
        problems.push(format!("no {} field (cookie fallback only)", config.csrf.form_field));
    }

    let required_ok = !problems.iter().any(|p| !p.contains("fallback"));
    Check::new(
        format!(".{CART_FORM_CLASS}[{index}]"),
        required_ok,
        true,
        problems.join(", "),
    )
}

fn check_favorite_button(page: &Page, button: NodeId, index: usize) -> Check {
    let mut problems = Vec::new();
    for attr in ["data-product-id", "data-is-favorite"] {
        if !page.has_attr(button, attr) {
            problems.push(format!("no {attr}"));
        }
    }
    for tag in ["i", "span"] {
        if page.select(button, &Selector::tag(tag)).is_none() {
            problems.push(format!("no <{tag}>"));
        }
    }
    Check::new(
        format!(".{FAVORITE_BUTTON_CLASS}[{index}]"),
        problems.is_empty(),
        true,
        problems.join(", "),
    )
}
