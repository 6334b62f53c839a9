//! Tracing layers for Kshetra

use tracing::{Subscriber, span};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::context::{UserContextData, UserContextGuard};

/// Layer that attaches the active user context to new spans
///
/// Spans opened while a [`UserContextGuard`] is live carry a
/// [`UserContextExtension`], so later layers can find the user even when
/// the span is entered from another thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserContextLayer;

impl UserContextLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct UserContextExtension {
    pub data: UserContextData,
}

impl<S> Layer<S> for UserContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(user) = UserContextGuard::current() {
            span.extensions_mut()
                .insert(UserContextExtension { data: user });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kshetra_core::{Role, StaticAuth};
    use parking_lot::Mutex;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::Registry;

    use super::*;

    /// Records the user found on each span as it is entered
    struct Probe(Arc<Mutex<Vec<Option<String>>>>);

    impl<S> Layer<S> for Probe
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
            let user = ctx.span(id).and_then(|span| {
                span.extensions()
                    .get::<UserContextExtension>()
                    .map(|ext| ext.data.user_id.clone())
            });
            self.0.lock().push(user);
        }
    }

    #[test]
    fn test_spans_carry_user_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default()
            .with(UserContextLayer::new())
            .with(Probe(seen.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let before = tracing::info_span!("before");
            let tagged = {
                let auth = StaticAuth::new(None, Role::Admin).with_user_id("admin");
                let _guard = UserContextGuard::new(&auth);
                tracing::info_span!("tagged")
            };

            // Entered after the guard is gone; the extension stays with the span
            tagged.in_scope(|| {});
            before.in_scope(|| {});
        });

        assert_eq!(*seen.lock(), vec![Some("admin".to_string()), None]);
    }
}
