use yew::prelude::*;

use shared::AvailabilityState;

#[derive(Properties, PartialEq)]
pub struct ModePickerProps {
    /// Currently active paint mode.
    pub mode: AvailabilityState,
    pub on_select: Callback<AvailabilityState>,
}

/// Four-way paint mode toggle. Exactly one button is active at a time;
/// selecting a mode only changes what subsequent gestures apply.
#[function_component(ModePicker)]
pub fn mode_picker(props: &ModePickerProps) -> Html {
    html! {
        <div class="button-group">
            { for AvailabilityState::ALL.iter().map(|state| {
                let state = *state;
                let class = if state == props.mode {
                    format!("mode-button {} active-button", state.css_class())
                } else {
                    format!("mode-button {}", state.css_class())
                };
                let on_select = props.on_select.clone();
                html! {
                    <button
                        type="button"
                        class={class}
                        onclick={Callback::from(move |_: MouseEvent| on_select.emit(state))}
                    >
                        { state.label() }
                    </button>
                }
            }) }
        </div>
    }
}
