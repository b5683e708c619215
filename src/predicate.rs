use crate::{error::StatError, file_type::FileKind, stat::RemoteFileStat, Metadata};

/// Existence and type checks over a remote filesystem client.
///
/// Every `bool` predicate issues exactly one `stat` or `lstat` call and
/// answers `false` on any failure, so callers never see an error. The `try_*`
/// forms answer the same question but return transport failures
/// ([`StatError::is_transport`]) instead of folding them into `false`.
///
/// Relative paths are resolved against the working directory set with
/// [`PathPredicates::chdir`], if any.
#[derive(Debug, Clone)]
pub struct PathPredicates<C> {
    client: C,
    cwd: Option<String>,
}

/// Generates a `bool` predicate from its `try_*` form
macro_rules! collapse {
    ($name:ident, $try_name:ident, $doc:expr) => {
        #[doc = $doc]
        pub async fn $name(&self, path: &str) -> bool {
            self.$try_name(path).await.unwrap_or_else(|err| {
                warn!("{}({:?}) lost to a transport failure: {}", stringify!($name), path, err);
                false
            })
        }
    };
}

impl<C: RemoteFileStat> PathPredicates<C> {
    pub const fn new(client: C) -> Self {
        Self { client, cwd: None }
    }

    /// The wrapped client, for every operation besides the predicates
    pub const fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    /// Current working directory, `None` until [`PathPredicates::chdir`] is called
    pub fn getcwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    /// Changes the directory that relative paths are resolved against.
    ///
    /// `None` clears it. Otherwise the path must `stat` as a directory and
    /// is stored in the canonical form returned by the client.
    pub async fn chdir(&mut self, path: Option<&str>) -> Result<(), StatError> {
        let Some(path) = path else {
            self.cwd = None;
            return Ok(());
        };

        let path = self.adjust_cwd(path);
        let attrs = self.client.stat(&path).await?;
        if !FileKind::of(&attrs).is_dir() {
            return Err(StatError::NotADirectory(path));
        }

        let canonical = self.client.canonicalize(&path).await?;
        debug!("chdir({path:?}) -> {canonical:?}");
        self.cwd = Some(canonical);

        Ok(())
    }

    /// Joins a relative path to the working directory
    pub fn adjust_cwd(&self, path: &str) -> String {
        match self.cwd.as_deref() {
            None => path.to_owned(),
            Some(_) if path.starts_with('/') => path.to_owned(),
            Some("/") => format!("/{path}"),
            Some(cwd) => format!("{cwd}/{path}"),
        }
    }

    collapse!(
        exists,
        try_exists,
        "Checks that `path` exists, following symlinks. A broken symlink does not exist."
    );
    collapse!(
        lexists,
        try_lexists,
        "Checks that `path` exists without following a final symlink. A broken symlink exists."
    );
    collapse!(
        isfile,
        try_isfile,
        "Checks that `path` resolves to a regular file, following symlinks."
    );
    collapse!(
        islink,
        try_islink,
        "Checks that `path` itself is a symlink, whether or not its target exists."
    );
    collapse!(
        isdir,
        try_isdir,
        "Checks that `path` resolves to a directory, following symlinks."
    );

    pub async fn try_exists(&self, path: &str) -> Result<bool, StatError> {
        let path = self.adjust_cwd(path);
        debug!("exists({path:?})");
        Ok(self.resolve(&path, false).await?.is_some())
    }

    pub async fn try_lexists(&self, path: &str) -> Result<bool, StatError> {
        let path = self.adjust_cwd(path);
        debug!("lexists({path:?})");
        Ok(self.resolve(&path, true).await?.is_some())
    }

    pub async fn try_isfile(&self, path: &str) -> Result<bool, StatError> {
        let path = self.adjust_cwd(path);
        debug!("isfile({path:?})");
        self.is_kind(&path, false, FileKind::Regular).await
    }

    pub async fn try_islink(&self, path: &str) -> Result<bool, StatError> {
        let path = self.adjust_cwd(path);
        debug!("islink({path:?})");
        self.is_kind(&path, true, FileKind::Symlink).await
    }

    pub async fn try_isdir(&self, path: &str) -> Result<bool, StatError> {
        let path = self.adjust_cwd(path);
        debug!("isdir({path:?})");
        self.is_kind(&path, false, FileKind::Directory).await
    }

    async fn is_kind(&self, path: &str, lstat: bool, kind: FileKind) -> Result<bool, StatError> {
        Ok(self
            .resolve(path, lstat)
            .await?
            .is_some_and(|attrs| FileKind::of(&attrs) == kind))
    }

    /// Runs the resolution call. Filesystem failures become `None`
    async fn resolve(&self, path: &str, lstat: bool) -> Result<Option<Metadata>, StatError> {
        let result = if lstat {
            self.client.lstat(path).await
        } else {
            self.client.stat(path).await
        };

        match result {
            Ok(attrs) => Ok(Some(attrs)),
            Err(err) if err.is_transport() => Err(err),
            Err(err) => {
                debug!("{err} ({path:?})");
                Ok(None)
            }
        }
    }
}
