//! Topic string parsing and authorization-derived scope metadata.
//!
//! A topic string has the form `key[:label1,label2,...][;seg1/seg2/...]`:
//! the identifier part before `;` names the event category and optional
//! labels, the path part after `;` carries positional arguments.

/// A project/namespace pair resolved from the domain cache.
///
/// Kept as an explicit pair so scope matching never relies on two parallel
/// lists staying index-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub name: String,
    pub namespace: String,
}

/// Authorization-derived scope attached to an admitted topic and later
/// merged into the session. Used by broadcast filters to decide which
/// sessions receive an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMetadata {
    /// Super-admin scope: every namespace is visible.
    pub all_namespaces: bool,
    /// Single-namespace scope.
    pub namespace: Option<String>,
    /// Specific resource name within the namespace.
    pub name: Option<String>,
    /// Project owning the namespace, if known to the cache.
    pub project_name: Option<String>,
    /// Enumerated visible projects for the list-everything scope.
    pub projects: Vec<ProjectRef>,
}

impl ScopeMetadata {
    /// Merge scope fields from another authorized topic into this one.
    /// Later topics win on scalar fields; project lists are concatenated.
    pub fn merge(&mut self, other: ScopeMetadata) {
        self.all_namespaces |= other.all_namespaces;
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.project_name.is_some() {
            self.project_name = other.project_name;
        }
        self.projects.extend(other.projects);
    }

    /// True if `project` is covered by the enumerated project list or the
    /// single-project scope.
    pub fn covers_project(&self, project: &str) -> bool {
        if self.projects.iter().any(|p| p.name == project) {
            return true;
        }
        self.project_name.as_deref() == Some(project)
    }
}

/// A parsed client-declared interest descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Event category, e.g. `shoots`.
    pub key: String,
    /// Ordered labels following the key, e.g. `unhealthy`.
    pub labels: Vec<String>,
    /// Positional path arguments, e.g. namespace and resource name.
    pub args: Vec<String>,
    /// Resolved scope; populated only once the topic is authorized.
    pub metadata: Option<ScopeMetadata>,
}

impl Topic {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Parse a raw topic string. Total: never fails, any malformed input yields
/// a topic whose unknown key is rejected downstream.
pub fn parse_topic(topic: &str) -> Topic {
    let mut parts = topic.splitn(2, ';');
    let id = parts.next().unwrap_or_default();
    let pathname = parts.next();
    let mut id_parts = id.split(':');
    let key = id_parts.next().unwrap_or_default().to_string();
    let labels: Vec<String> = id_parts.map(str::to_string).collect();
    let args: Vec<String> = match pathname {
        Some(path) => path.split('/').map(str::to_string).collect(),
        None => Vec::new(),
    };
    Topic {
        key,
        labels,
        args,
        metadata: None,
    }
}
