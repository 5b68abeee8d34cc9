//! Demo client for unistate
//!
//! Shows one component that keeps purely local state and one that talks to
//! the backend through the session.
//!
//! Run the server first:
//!   cargo run -p unistate_server
//!
//! Then run this client:
//!   cd demos/axpy/client
//!   trunk serve --open

use leptos::prelude::*;
use unistate_client::{LinkStatusBadge, SessionConfig, SessionErrorBanner, SessionProvider, use_session};
use unistate_common::Action;

fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    leptos::mount::mount_to_body(App);
}

#[component]
fn App() -> impl IntoView {
    // The backend runs on the same host that served the page
    let host = window()
        .location()
        .hostname()
        .unwrap_or_else(|_| "localhost".to_string());

    view! {
        <SessionProvider config=SessionConfig::for_host(host)>
            <header>
                <LinkStatusBadge />
            </header>
            <main>
                <SessionErrorBanner />
                <YakShavingCard />
                <AxpyCard />
            </main>
        </SessionProvider>
    }
}

/// Doesn't touch the session at all.
#[component]
fn YakShavingCard() -> impl IntoView {
    let (shaved, set_shaved) = signal(false);

    view! {
        <article class="card">
            <header>"Yak Shaving Status"</header>
            <p>
                "The yak has " {move || if shaved.get() { "" } else { "not " }} "been shaven."
            </p>
            <button on:click=move |_| set_shaved.set(true)>"Shave the yak!"</button>
        </article>
    }
}

#[component]
fn AxpyCard() -> impl IntoView {
    let (state, dispatch) = use_session();

    let (a, set_a) = signal(3.15);
    let (x, set_x) = signal(vec![3.0, 7.0, 31.0, 127.0]);
    let (y, set_y) = signal(vec![6.0, 28.0, 496.0, 8128.0]);

    let run = move |_| dispatch.dispatch(Action::axpy(a.get(), x.get(), y.get()));
    let result = move || join(&state.get().result_vector());

    view! {
        <article class="card">
            <header>"Multiply Vectors"</header>
            <p>"Compute a * x + y"</p>

            <label for="a">"a"</label>
            <input
                name="a"
                type="number"
                value=a.get_untracked()
                on:change=move |ev| {
                    if let Ok(value) = event_target_value(&ev).trim().parse() {
                        set_a.set(value);
                    }
                }
            />

            <label for="x">"x"</label>
            <input
                name="x"
                value=join(&x.get_untracked())
                on:change=move |ev| set_x.set(parse_vector(&event_target_value(&ev)))
            />

            <label for="y">"y"</label>
            <input
                name="y"
                value=join(&y.get_untracked())
                on:change=move |ev| set_y.set(parse_vector(&event_target_value(&ev)))
            />

            <button on:click=run>"Run Calculation!"</button>
            <p>"Result: " {result}</p>
        </article>
    }
}

/// Whitespace separated numbers; anything unparseable is skipped.
fn parse_vector(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .filter_map(|item| item.parse().ok())
        .collect()
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
