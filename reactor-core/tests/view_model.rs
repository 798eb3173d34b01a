//! View Model Tests
//!
//! Exercises the engine the way an application uses it: a view model built
//! from vars, "widgets" rendered by computations, and a main loop that runs
//! the scheduled flushes between input events.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use reactor_core::{Computation, MainLoop, Reactor, Var};

const PIZZA: &str = "PIZZA";
const MANGOES: &str = "MANGOES";

/// Favorite-food screen state.
#[derive(Clone)]
struct FavoriteFoodViewModel {
    is_pizza: Var<bool>,
    favorite_food: Var<String>,
    favorite_percentage: Var<u8>,
    edit_text: Var<String>,
}

impl FavoriteFoodViewModel {
    fn new(reactor: &Reactor, favorite_food: &str, favorite_percentage: u8) -> Self {
        Self {
            is_pizza: Var::new_in(reactor, favorite_food == PIZZA),
            favorite_food: Var::new_in(reactor, favorite_food.to_string()),
            favorite_percentage: Var::new_in(reactor, favorite_percentage),
            edit_text: Var::new_in(reactor, String::new()),
        }
    }

    /// The button handler: flips between the two foods.
    fn toggle(&self) {
        let is_pizza = !self.is_pizza.get_untracked();
        self.is_pizza.set(is_pizza);
        self.favorite_food
            .set(if is_pizza { PIZZA } else { MANGOES }.to_string());
    }
}

/// Rendered text per widget, plus how often each was rendered.
#[derive(Clone, Default)]
struct Screen {
    labels: Rc<RefCell<BTreeMap<&'static str, String>>>,
    renders: Rc<RefCell<BTreeMap<&'static str, usize>>>,
}

impl Screen {
    fn render(&self, widget: &'static str, text: String) {
        self.labels.borrow_mut().insert(widget, text);
        *self.renders.borrow_mut().entry(widget).or_default() += 1;
    }

    fn label(&self, widget: &str) -> String {
        self.labels.borrow().get(widget).cloned().unwrap_or_default()
    }

    fn renders(&self, widget: &str) -> usize {
        self.renders.borrow().get(widget).copied().unwrap_or(0)
    }
}

/// Bind every widget to the view model, returning the computations.
fn bind(reactor: &Reactor, model: &FavoriteFoodViewModel, screen: &Screen) -> Vec<Computation> {
    let mut bindings = Vec::new();

    let (m, s) = (model.clone(), screen.clone());
    bindings.push(reactor.auto_run(move |_| {
        s.render("text", format!("My favorite food is {}", m.favorite_food.get()));
    }));

    let (m, s) = (model.clone(), screen.clone());
    bindings.push(reactor.auto_run(move |_| {
        let label = if m.is_pizza.get() { "Switch to mangoes" } else { "Switch to pizza" };
        s.render("button", label.to_string());
    }));

    let (m, s) = (model.clone(), screen.clone());
    bindings.push(reactor.auto_run(move |_| {
        s.render("slider", format!("{}%", m.favorite_percentage.get()));
    }));

    let (m, s) = (model.clone(), screen.clone());
    bindings.push(reactor.auto_run(move |_| {
        s.render("echo", m.edit_text.with(|text| text.to_uppercase()));
    }));

    bindings
}

fn setup() -> (Reactor, MainLoop, FavoriteFoodViewModel, Screen, Vec<Computation>) {
    let reactor = Reactor::new();
    let main_loop = MainLoop::new();
    reactor.set_flush_scheduler(main_loop.clone());

    let model = FavoriteFoodViewModel::new(&reactor, PIZZA, 50);
    let screen = Screen::default();
    let bindings = bind(&reactor, &model, &screen);
    (reactor, main_loop, model, screen, bindings)
}

/// Test that binding renders every widget once, synchronously.
#[test]
fn initial_render() {
    let (_reactor, main_loop, _model, screen, _bindings) = setup();

    assert_eq!(screen.label("text"), "My favorite food is PIZZA");
    assert_eq!(screen.label("button"), "Switch to mangoes");
    assert_eq!(screen.label("slider"), "50%");
    assert_eq!(screen.label("echo"), "");
    assert!(main_loop.is_empty());
}

/// Test that an input event only re-renders the widgets that read the
/// changed state.
#[test]
fn input_rerenders_affected_widgets_only() {
    let (_reactor, main_loop, model, screen, _bindings) = setup();

    model.toggle();
    assert_eq!(screen.label("text"), "My favorite food is PIZZA");
    main_loop.run_until_idle();

    assert_eq!(screen.label("text"), "My favorite food is MANGOES");
    assert_eq!(screen.label("button"), "Switch to pizza");
    assert_eq!(screen.renders("text"), 2);
    assert_eq!(screen.renders("button"), 2);
    assert_eq!(screen.renders("slider"), 1);
    assert_eq!(screen.renders("echo"), 1);
}

/// Test that a burst of events between loop iterations renders once.
#[test]
fn bursts_are_batched_into_one_flush() {
    let (_reactor, main_loop, model, screen, _bindings) = setup();

    for percentage in [10, 20, 30, 40] {
        model.favorite_percentage.set(percentage);
    }
    for letter in ["h", "hi", "hi!"] {
        model.edit_text.set(letter.to_string());
    }
    assert_eq!(main_loop.len(), 1);

    main_loop.run_until_idle();
    assert_eq!(screen.label("slider"), "40%");
    assert_eq!(screen.label("echo"), "HI!");
    assert_eq!(screen.renders("slider"), 2);
    assert_eq!(screen.renders("echo"), 2);
}

/// Test that the scheduled flush runs before already-queued input events.
#[test]
fn flush_runs_ahead_of_queued_events() {
    let (_reactor, main_loop, model, screen, _bindings) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));

    // An event already in the queue observes the screen when it runs.
    let (s, log) = (screen.clone(), seen.clone());
    main_loop.post(move || log.borrow_mut().push(s.label("slider")));

    model.favorite_percentage.set(75);
    main_loop.run_until_idle();

    assert_eq!(*seen.borrow(), vec!["75%".to_string()]);
}

/// Test that unbinding a widget freezes it.
#[test]
fn stopped_bindings_stop_rendering() {
    let (reactor, main_loop, model, screen, bindings) = setup();

    for binding in &bindings {
        binding.stop();
    }
    model.toggle();
    model.favorite_percentage.set(99);
    main_loop.run_until_idle();

    assert_eq!(screen.label("text"), "My favorite food is PIZZA");
    assert_eq!(screen.label("slider"), "50%");
    assert_eq!(reactor.computation_count(), 0);
}

/// Test a derived binding that reads several vars at once.
#[test]
fn binding_reads_multiple_vars() {
    let (reactor, main_loop, model, screen, _bindings) = setup();

    let (m, s) = (model.clone(), screen.clone());
    reactor.auto_run(move |_| {
        let summary = format!(
            "{} at {}%",
            m.favorite_food.get().to_lowercase(),
            m.favorite_percentage.get()
        );
        s.render("summary", summary);
    });
    assert_eq!(screen.label("summary"), "pizza at 50%");

    model.favorite_percentage.set(80);
    model.toggle();
    main_loop.run_until_idle();

    assert_eq!(screen.label("summary"), "mangoes at 80%");
    assert_eq!(screen.renders("summary"), 2);
}
