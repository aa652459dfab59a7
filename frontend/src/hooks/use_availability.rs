use std::rc::Rc;

use chrono::NaiveDate;
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, BeforeUnloadEvent};
use yew::prelude::*;

use shared::{AvailabilityModel, AvailabilityState, GridLayout};

use crate::services::api::ApiClient;
use crate::services::bootstrap::{GridVariant, PageBootstrap};
use crate::services::date_utils;
use crate::services::logging::Logger;
use crate::services::navigation::navigate_to;

/// Everything the widget renders from: the current layout, the selection
/// model, and the page-level UI flags.
#[derive(Clone, PartialEq)]
pub struct GridSession {
    pub bootstrap: Rc<PageBootstrap>,
    pub layout: Rc<GridLayout>,
    pub model: AvailabilityModel,
    pub notes_visible: bool,
    pub submitting: bool,
    pub error: Option<String>,
    year: i32,
}

pub enum GridAction {
    SelectMonth(u32),
    SelectWeek(NaiveDate),
    SetMode(AvailabilityState),
    Press { row: usize, col: usize },
    Enter { row: usize, col: usize },
    Release,
    EditNote { date_key: String, text: String },
    ToggleNotes,
    SubmitStarted,
    SubmitFailed(String),
}

impl GridSession {
    fn initial(bootstrap: Rc<PageBootstrap>) -> Self {
        let year = date_utils::current_year();
        let layout = match bootstrap.variant() {
            GridVariant::Week => {
                let start = bootstrap
                    .initial_week_start()
                    .unwrap_or_else(|| date_utils::week_monday(date_utils::current_date()));
                GridLayout::week(start)
            }
            GridVariant::Month => {
                Self::month_layout(&bootstrap, year, date_utils::current_month())
            }
        };
        let model = AvailabilityModel::new(&layout, &bootstrap.existing, &bootstrap.notes);
        Self {
            bootstrap,
            layout: Rc::new(layout),
            model,
            notes_visible: false,
            submitting: false,
            error: None,
            year,
        }
    }

    fn month_layout(bootstrap: &PageBootstrap, year: i32, month: u32) -> GridLayout {
        GridLayout::month(year, month, &bootstrap.markers).unwrap_or_else(|error| {
            Logger::warn_with_component(
                "availability-grid",
                &format!("{}, falling back to January", error),
            );
            GridLayout::month(year, 1, &bootstrap.markers).expect("January is a valid month")
        })
    }

    /// Replaces the rendered period wholesale: fresh layout, fresh buffer and
    /// clean snapshot. The paint mode carries over.
    fn replace_layout(&mut self, layout: GridLayout) {
        let mode = self.model.mode();
        let mut model =
            AvailabilityModel::new(&layout, &self.bootstrap.existing, &self.bootstrap.notes);
        model.set_mode(mode);
        self.layout = Rc::new(layout);
        self.model = model;
    }
}

impl Reducible for GridSession {
    type Action = GridAction;

    fn reduce(self: Rc<Self>, action: GridAction) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            GridAction::SelectMonth(month) => {
                let layout = Self::month_layout(&next.bootstrap, next.year, month);
                next.replace_layout(layout);
            }
            GridAction::SelectWeek(start) => {
                next.replace_layout(GridLayout::week(start));
            }
            GridAction::SetMode(mode) => next.model.set_mode(mode),
            GridAction::Press { row, col } => {
                let layout = next.layout.clone();
                next.model.press(&layout, row, col);
            }
            GridAction::Enter { row, col } => {
                let layout = next.layout.clone();
                next.model.drag_to(&layout, row, col);
            }
            GridAction::Release => next.model.release(),
            GridAction::EditNote { date_key, text } => next.model.set_note(&date_key, text),
            GridAction::ToggleNotes => next.notes_visible = !next.notes_visible,
            GridAction::SubmitStarted => {
                next.submitting = true;
                next.error = None;
            }
            GridAction::SubmitFailed(message) => {
                next.submitting = false;
                next.error = Some(message);
            }
        }
        Rc::new(next)
    }
}

#[derive(Clone)]
pub struct UseAvailabilityResult {
    pub session: UseReducerHandle<GridSession>,
    pub actions: GridActions,
}

#[derive(Clone)]
pub struct GridActions {
    pub select_month: Callback<u32>,
    pub select_week: Callback<String>,
    pub set_mode: Callback<AvailabilityState>,
    pub press: Callback<(usize, usize)>,
    pub enter: Callback<(usize, usize)>,
    pub edit_note: Callback<(String, String)>,
    pub toggle_notes: Callback<MouseEvent>,
    pub submit: Callback<()>,
}

#[hook]
pub fn use_availability(bootstrap: &Rc<PageBootstrap>) -> UseAvailabilityResult {
    let session = use_reducer_eq({
        let bootstrap = bootstrap.clone();
        move || GridSession::initial(bootstrap)
    });

    // A gesture ends on pointer-up anywhere in the document, not just over
    // the grid.
    {
        let session = session.clone();
        use_effect_with((), move |_| {
            let document = window()
                .expect("should have window")
                .document()
                .expect("should have document");
            let listener = EventListener::new(&document, "mouseup", move |_| {
                session.dispatch(GridAction::Release);
            });
            move || drop(listener)
        });
    }

    // Unsaved-change guard, week view only. The listener reads the latest
    // dirty flag through a shared ref so it never acts on a stale snapshot,
    // and an in-flight submission disarms it so the post-submit navigation
    // is not blocked.
    let unsaved = use_mut_ref(|| false);
    {
        let unsaved = unsaved.clone();
        let dirty = session.model.is_dirty() && !session.submitting;
        use_effect(move || {
            *unsaved.borrow_mut() = dirty;
            || ()
        });
    }
    {
        let unsaved = unsaved.clone();
        let armed = bootstrap.variant() == GridVariant::Week;
        use_effect_with(armed, move |armed| {
            let listener = armed.then(|| {
                let options = EventListenerOptions::enable_prevent_default();
                EventListener::new_with_options(
                    &window().expect("should have window"),
                    "beforeunload",
                    options,
                    move |event| {
                        if !*unsaved.borrow() {
                            return;
                        }
                        event.prevent_default();
                        if let Some(event) = event.dyn_ref::<BeforeUnloadEvent>() {
                            event.set_return_value("Availability changes are not saved yet.");
                        }
                    },
                )
            });
            move || drop(listener)
        });
    }

    let select_month = {
        let session = session.clone();
        Callback::from(move |month: u32| session.dispatch(GridAction::SelectMonth(month)))
    };

    let select_week = {
        let session = session.clone();
        Callback::from(move |value: String| match date_utils::parse_week_start(&value) {
            Some(start) => session.dispatch(GridAction::SelectWeek(start)),
            None => Logger::warn_with_component(
                "availability-grid",
                &format!("Ignoring unparsable week start `{}`", value),
            ),
        })
    };

    let set_mode = {
        let session = session.clone();
        Callback::from(move |mode: AvailabilityState| session.dispatch(GridAction::SetMode(mode)))
    };

    // Race-marked cells navigate instead of painting; the redirect is a side
    // effect, so it stays out of the reducer.
    let press = {
        let session = session.clone();
        Callback::from(move |(row, col): (usize, usize)| {
            let navigating = session
                .layout
                .cell_at(row, col)
                .and_then(|cell| cell.marker.as_ref())
                .map(|marker| marker.kind.navigates())
                .unwrap_or(false);
            if navigating {
                navigate_to(&session.bootstrap.config.races_url);
            } else {
                session.dispatch(GridAction::Press { row, col });
            }
        })
    };

    let enter = {
        let session = session.clone();
        Callback::from(move |(row, col): (usize, usize)| {
            session.dispatch(GridAction::Enter { row, col });
        })
    };

    let edit_note = {
        let session = session.clone();
        Callback::from(move |(date_key, text): (String, String)| {
            session.dispatch(GridAction::EditNote { date_key, text });
        })
    };

    let toggle_notes = {
        let session = session.clone();
        Callback::from(move |_: MouseEvent| session.dispatch(GridAction::ToggleNotes))
    };

    let submit = {
        let session = session.clone();
        Callback::from(move |_: ()| {
            if session.submitting {
                return;
            }
            let payload = session
                .model
                .payload(&session.bootstrap.config.name, &session.layout.period);
            let api = ApiClient::new(session.bootstrap.config.action.clone());
            session.dispatch(GridAction::SubmitStarted);
            let session = session.clone();
            spawn_local(async move {
                match api.submit_availability(&payload).await {
                    Ok(url) => navigate_to(&url),
                    Err(error) => {
                        Logger::error_with_component("availability-grid", &error);
                        session.dispatch(GridAction::SubmitFailed(error));
                    }
                }
            });
        })
    };

    UseAvailabilityResult {
        session,
        actions: GridActions {
            select_month,
            select_week,
            set_mode,
            press,
            enter,
            edit_note,
            toggle_notes,
            submit,
        },
    }
}
