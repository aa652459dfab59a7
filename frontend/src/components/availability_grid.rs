use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlInputElement};
use yew::prelude::*;

use shared::{AvailabilityModel, AvailabilityState, GridLayout, GridSlot};

#[derive(Properties, PartialEq)]
pub struct AvailabilityGridProps {
    pub layout: Rc<GridLayout>,
    pub model: AvailabilityModel,
    /// Whether the per-cell note inputs render as text instead of hidden.
    pub notes_visible: bool,
    pub on_press: Callback<(usize, usize)>,
    pub on_enter: Callback<(usize, usize)>,
    /// Emits `(date_key, new_text)` when a note input changes.
    pub on_note_change: Callback<(String, String)>,
}

/// The grid table. Cell classes are a pure projection of the selection
/// buffer; nothing is ever read back out of the DOM.
#[function_component(AvailabilityGrid)]
pub fn availability_grid(props: &AvailabilityGridProps) -> Html {
    let layout = &props.layout;
    let has_row_headers = !layout.row_headers.is_empty();

    html! {
        <table id="availabilityTable" class="availability-table">
            <thead>
                <tr>
                    { if has_row_headers { html! { <th></th> } } else { html! {} } }
                    { for layout.col_headers.iter().map(|header| html! {
                        <th>{ header }</th>
                    }) }
                </tr>
            </thead>
            <tbody id="calendarBody">
                { for layout.rows().iter().enumerate().map(|(row, slots)| html! {
                    <tr>
                        { if has_row_headers {
                            html! { <th>{ &layout.row_headers[row] }</th> }
                        } else {
                            html! {}
                        } }
                        { for slots.iter().enumerate().map(|(col, slot)| {
                            render_slot(props, row, col, slot)
                        }) }
                    </tr>
                }) }
            </tbody>
        </table>
    }
}

fn render_slot(props: &AvailabilityGridProps, row: usize, col: usize, slot: &GridSlot) -> Html {
    let cell = match slot {
        GridSlot::Cell(cell) => cell,
        GridSlot::Filler => return html! { <td class="fill-grey"></td> },
    };

    let state = props
        .model
        .state_of(&cell.date_key)
        .unwrap_or(AvailabilityState::Available);
    let mut class = format!("grid-cell {}", state.css_class());
    let mut title = String::new();
    if let Some(marker) = &cell.marker {
        class.push(' ');
        class.push_str(marker.kind.css_class());
        title = marker.tooltip.clone();
    }

    let on_press = {
        let on_press = props.on_press.clone();
        Callback::from(move |event: MouseEvent| {
            // A press on the note input edits the note, it never paints.
            if let Some(target) = event.target() {
                if let Ok(element) = target.dyn_into::<HtmlElement>() {
                    if element.tag_name().to_lowercase() == "input" {
                        return;
                    }
                }
            }
            // Keep the drag from starting a text selection.
            event.prevent_default();
            on_press.emit((row, col));
        })
    };
    let on_enter = {
        let on_enter = props.on_enter.clone();
        Callback::from(move |_: MouseEvent| on_enter.emit((row, col)))
    };
    let on_note_change = {
        let on_note_change = props.on_note_change.clone();
        let date_key = cell.date_key.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_note_change.emit((date_key.clone(), input.value()));
        })
    };

    html! {
        <td
            class={class}
            title={title}
            data-date={cell.date_key.clone()}
            onmousedown={on_press}
            onmouseenter={on_enter}
        >
            { &cell.label }
            <input
                class="note-input"
                type={if props.notes_visible { "text" } else { "hidden" }}
                name={format!("input-{}", cell.date_key)}
                value={props.model.note_of(&cell.date_key).to_string()}
                onchange={on_note_change}
            />
        </td>
    }
}
