use web_sys::HtmlSelectElement;
use yew::prelude::*;

mod components;
mod hooks;
mod services;

use components::{AvailabilityGrid, ModePicker};
use hooks::use_availability::use_availability;
use services::bootstrap::{GridVariant, PageBootstrap};
use services::date_utils::month_name;
use shared::PeriodRef;

#[function_component(App)]
fn app() -> Html {
    let bootstrap = use_memo((), |_| PageBootstrap::load());
    let grid = use_availability(&bootstrap);
    let session = &grid.session;

    let period_title = match session.layout.period {
        PeriodRef::Month { month, year } => format!("{} {}", month_name(month), year),
        PeriodRef::Week { start } => format!("Week of {}", start.format("%d/%m/%Y")),
    };

    let on_month_change = {
        let select_month = grid.actions.select_month.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            if let Ok(month) = select.value().parse::<u32>() {
                select_month.emit(month);
            }
        })
    };
    let on_week_change = {
        let select_week = grid.actions.select_week.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            select_week.emit(select.value());
        })
    };
    let on_submit = {
        let submit = grid.actions.submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            submit.emit(());
        })
    };

    let period_selector = match bootstrap.variant() {
        GridVariant::Month => {
            let current = match session.layout.period {
                PeriodRef::Month { month, .. } => month,
                _ => 1,
            };
            html! {
                <select id="monthSelector" class="form-control" onchange={on_month_change}>
                    { for (1..=12u32).map(|month| html! {
                        <option value={month.to_string()} selected={month == current}>
                            { month_name(month) }
                        </option>
                    }) }
                </select>
            }
        }
        GridVariant::Week => {
            let current = match session.layout.period {
                PeriodRef::Week { start } => start.format("%d/%m/%Y").to_string(),
                _ => String::new(),
            };
            html! {
                <select id="weekSelector" class="form-control" onchange={on_week_change}>
                    { for bootstrap.config.week_starts.iter().map(|value| html! {
                        <option value={value.clone()} selected={*value == current}>
                            { value }
                        </option>
                    }) }
                </select>
            }
        }
    };

    html! {
        <>
            <header class="header">
                <div class="container">
                    <h1>{"Crew Availability"}</h1>
                    <h2 class="period-title">{ period_title }</h2>
                </div>
            </header>

            <main class="main">
                <div class="container">
                    <div class="grid-controls">
                        { period_selector }
                        <ModePicker
                            mode={session.model.mode()}
                            on_select={grid.actions.set_mode.clone()}
                        />
                    </div>

                    { if let Some(error) = session.error.as_ref() {
                        html! { <div class="form-message error">{ error }</div> }
                    } else {
                        html! {}
                    } }

                    <form id="availabilityForm" class="availability-form" onsubmit={on_submit}>
                        <AvailabilityGrid
                            layout={session.layout.clone()}
                            model={session.model.clone()}
                            notes_visible={session.notes_visible}
                            on_press={grid.actions.press.clone()}
                            on_enter={grid.actions.enter.clone()}
                            on_note_change={grid.actions.edit_note.clone()}
                        />

                        { if !bootstrap.config.name.is_empty() {
                            html! {
                                <p class="member-name">
                                    { format!("Submitting as {}", bootstrap.config.name) }
                                </p>
                            }
                        } else {
                            html! {}
                        } }

                        <div class="form-actions">
                            <button
                                type="button"
                                id="showNotes"
                                class="btn btn-secondary"
                                onclick={grid.actions.toggle_notes.clone()}
                            >
                                { if session.notes_visible { "Hide notes" } else { "Show notes" } }
                            </button>
                            <button type="submit" class="btn btn-primary" disabled={session.submitting}>
                                { if session.submitting { "Saving..." } else { "Submit availability" } }
                            </button>
                        </div>
                    </form>
                </div>
            </main>
        </>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
