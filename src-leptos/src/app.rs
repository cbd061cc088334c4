//! Demo page: a language switcher and a view that follows the locale

use crate::context::{provide_locale_context, use_locale, LocaleContext};
use langpref_core::types::LocaleCode;
use leptos::prelude::*;

fn greeting(locale: Option<&LocaleCode>) -> &'static str {
    match locale.map(|l| l.base()) {
        Some("ru") => "Добро пожаловать",
        Some("kk") => "Қош келдіңіз",
        _ => "Welcome",
    }
}

/// `(native, English)` names for the switcher. Unknown bases show the code.
fn display_name(code: &LocaleCode) -> String {
    let names = match code.base() {
        "en" => Some(("English", "English")),
        "ru" => Some(("Русский", "Russian")),
        "kk" => Some(("Қазақша", "Kazakh")),
        _ => None,
    };
    match names {
        Some((native, english)) if native == english => native.to_string(),
        Some((native, english)) => format!("{native} ({english})"),
        None => code.to_string(),
    }
}

/// Root App component
#[component]
pub fn App() -> impl IntoView {
    let context = match provide_locale_context() {
        Ok(context) => Some(context),
        Err(e) => {
            log::error!("Locale context unavailable: {e}");
            None
        },
    };

    view! {
        <div class="app-container">
            <main class="main-content">
                {match context {
                    Some(_) => view! { <Greeting /> <LanguageSwitcher /> }.into_any(),
                    None => view! { <p class="error">"Language sync is not running"</p> }.into_any(),
                }}
            </main>
        </div>
    }
}

#[component]
fn Greeting() -> impl IntoView {
    let ctx = use_locale();
    view! {
        <h1>{move || greeting(ctx.and_then(|c| c.locale()).as_ref())}</h1>
    }
}

/// Locale dropdown; the selection goes through the engine, the label
/// follows the context signal.
#[component]
pub fn LanguageSwitcher() -> impl IntoView {
    let Some(ctx) = use_locale() else {
        return view! { <span></span> }.into_any();
    };
    let error = RwSignal::new(Option::<String>::None);

    let on_change = move |ev: leptos::ev::Event| {
        let code = event_target_value(&ev);
        match ctx.request(&code) {
            Ok(outcome) if !outcome.persisted => {
                error.set(Some("Saved for this page only; cookies are unavailable".to_string()));
            },
            Ok(_) => error.set(None),
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    view! {
        <div class="language-switcher">
            <select on:change=on_change>
                {options(ctx)}
            </select>
            <Show when=move || error.get().is_some()>
                <p class="warning">{move || error.get().unwrap_or_default()}</p>
            </Show>
        </div>
    }
    .into_any()
}

fn options(ctx: LocaleContext) -> impl IntoView {
    ctx.supported()
        .into_iter()
        .map(|code| {
            let value = code.to_string();
            let label = display_name(&code);
            let selected = code.clone();
            view! {
                <option value=value selected=move || ctx.locale().as_ref() == Some(&selected)>
                    {label}
                </option>
            }
        })
        .collect_view()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_shows_native_and_english() {
        assert_eq!(display_name(&LocaleCode::parse("ru").unwrap()), "Русский (Russian)");
        assert_eq!(display_name(&LocaleCode::parse("kk-KZ").unwrap()), "Қазақша (Kazakh)");
        assert_eq!(display_name(&LocaleCode::parse("en").unwrap()), "English");
    }

    #[test]
    fn test_display_name_falls_back_to_code() {
        assert_eq!(display_name(&LocaleCode::parse("de-at").unwrap()), "de-at");
    }
}
