use std::marker::PhantomData;
use tracing::{debug, field, info, warn, Span};
use uuid::Uuid;

use crate::model::EntryKey;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    /// Root spans declare an empty `session` field for `root_span_kv` to fill.
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, session: Uuid, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        span.record("session", field::display(session));
        let details = kv_to_string(fields);
        span.in_scope(|| {
            if details.is_empty() {
                debug!(op = %self.op_name(), "start");
            } else {
                debug!(op = %self.op_name(), details = %details, "start");
            }
        });
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn debug_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json {
            let details = kv_to_string(kv);
            debug!(op = %self.op_name(), details = %details, "{}", msg);
        } else {
            debug!("{}", msg);
        }
    }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json {
            let details = kv_to_string(kv);
            warn!(op = %self.op_name(), details = %details, "{}", msg);
        } else {
            warn!("{} {}", msg, kv_to_string(kv));
        }
    }
}

impl LogCtx<crate::telemetry::ops::fetch::Fetch> {
    pub fn page_summary(
        &self,
        action: &str,
        fetched: usize,
        added: usize,
        total: usize,
        has_more: bool,
    ) {
        if self.json {
            info!(op = %self.op_name(), action, fetched, added, total, has_more, "page_applied");
        } else {
            info!(
                "📥 {} — fetched={} added={} total={} has_more={}",
                action, fetched, added, total, has_more
            );
        }
    }
}

impl LogCtx<crate::telemetry::ops::interact::Interact> {
    pub fn rolled_back(&self, action: &str, key: EntryKey, reason: &str) {
        if self.json {
            warn!(op = %self.op_name(), action, entry = %key, reason, "rolled_back");
        } else {
            warn!("↩️ {} {} rolled back: {}", action, key, reason);
        }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv {
        parts.push(format!("{}={}", k, v));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::Subscriber;
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;

    use super::*;
    use crate::telemetry;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(String, String)>>>);

    impl Visit for Recorded {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.lock().unwrap().push((field.name().to_string(), format!("{value:?}")));
        }
    }

    // Collects span fields, both at creation and from later `record` calls.
    struct SpanFields(Recorded);

    impl<S: Subscriber + for<'l> LookupSpan<'l>> Layer<S> for SpanFields {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            attrs.record(&mut self.0.clone());
        }

        fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
            values.record(&mut self.0.clone());
        }
    }

    #[test]
    fn kv_pairs_join_with_spaces() {
        let s = kv_to_string([("entry", "post:1".to_string()), ("profile", "7".to_string())]);
        assert_eq!(s, "entry=post:1 profile=7");
        assert_eq!(kv_to_string(Vec::<(&str, String)>::new()), "");
    }

    #[test]
    fn root_spans_carry_the_session() {
        let recorded = Recorded::default();
        let subscriber = tracing_subscriber::registry().with(SpanFields(recorded.clone()));
        let session = Uuid::new_v4();

        tracing::subscriber::with_default(subscriber, || {
            let fetch =
                telemetry::fetch().root_span_kv(session, [("action", "refresh".to_string())]);
            assert!(fetch.metadata().unwrap().fields().field("session").is_some());
            let interact = telemetry::interact().root_span_kv(session, Vec::new());
            assert!(interact.metadata().unwrap().fields().field("session").is_some());
        });

        let fields = recorded.0.lock().unwrap().clone();
        let expected = session.to_string();
        let sessions = fields.iter().filter(|(k, v)| k == "session" && *v == expected);
        assert_eq!(sessions.count(), 2);
    }
}
