use leptos::prelude::*;

use crate::hooks::{use_link_status, use_session};
use crate::session::LinkStatus;

/// Shows the error recorded in the session state, if any.
///
/// Renders nothing while the session has no `error` field.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <SessionProvider>
///         <SessionErrorBanner />
///         <Dashboard />
///     </SessionProvider>
/// }
/// ```
#[component]
pub fn SessionErrorBanner(
    /// CSS class for the banner element
    #[prop(optional)]
    class: Option<&'static str>,
) -> impl IntoView {
    let (state, _) = use_session();
    let report = Memo::new(move |_| state.get().error());

    move || {
        report.get().map(|report| {
            view! {
                <article class=class.unwrap_or("card error")>
                    <header>{report.error()}</header>
                    {report.details().map(|details| view! { <pre>{details}</pre> })}
                </article>
            }
        })
    }
}

/// Small badge reflecting whether the socket is still usable.
#[component]
pub fn LinkStatusBadge() -> impl IntoView {
    let status = use_link_status();

    move || match status.get() {
        LinkStatus::Open => view! { <span class="link-status open">"connected"</span> }.into_any(),
        LinkStatus::Closed => view! { <span class="link-status closed">"disconnected"</span> }.into_any(),
    }
}
