#[derive(Debug, Clone)]
pub struct TelemetryLabels {
    pub provider: String,
    pub event_type: Option<String>,
    pub event_id: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            event_type: None,
            event_id: None,
            extra: Vec::new(),
        }
    }

    pub fn with_event(mut self, event_type: impl Into<String>, event_id: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Tags suitable for metric labels. The event id is left out to keep
    /// label cardinality bounded.
    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(2 + self.extra.len());
        tags.push(("provider".into(), self.provider.clone()));
        if let Some(kind) = &self.event_type {
            tags.push(("event_type".into(), kind.clone()));
        }
        for (key, value) in &self.extra {
            tags.push((key.clone(), value.clone()));
        }
        tags
    }
}
