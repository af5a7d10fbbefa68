use anyhow::bail;
use pkg_types::namespace::Namespace;
use pkg_types::pod::Pod;
use pkg_types::secret::Secret;
use reqwest::StatusCode;
use tracing::info;

/// HTTP client for the cluster control-plane API.
#[derive(Clone)]
pub struct ClusterClient {
    base: String,
    http: reqwest::Client,
}

impl ClusterClient {
    pub fn new(server: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base: server.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ─── Namespaces ────────────────────────────────────────────────────────

    pub async fn namespace_exists(&self, name: &str) -> anyhow::Result<bool> {
        let resp = self
            .http
            .get(self.url(&format!("/api/v1/namespaces/{}", name)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => bail!("looking up namespace '{}' failed: server returned {}", name, s),
        }
    }

    pub async fn create_namespace(&self, namespace: &Namespace) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(self.url("/api/v1/namespaces"))
            .json(namespace)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "creating namespace '{}' failed: server returned {}",
                namespace.name,
                resp.status()
            );
        }
        info!("Created namespace {}", namespace.name);
        Ok(())
    }

    /// Delete a namespace. A namespace that is already gone is fine.
    pub async fn delete_namespace(&self, name: &str) -> anyhow::Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/v1/namespaces/{}", name)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => {
                info!("Deleted namespace {}", name);
                Ok(())
            }
            s => bail!("deleting namespace '{}' failed: server returned {}", name, s),
        }
    }

    // ─── Secrets ───────────────────────────────────────────────────────────

    pub async fn create_secret(&self, secret: &Secret) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(self.url("/api/v1/secrets"))
            .json(secret)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "creating secret {}/{} failed: server returned {}",
                secret.namespace,
                secret.name,
                resp.status()
            );
        }
        info!("Created secret {}/{}", secret.namespace, secret.name);
        Ok(())
    }

    /// Delete a secret. A secret that is already gone is fine.
    pub async fn delete_secret(&self, namespace: &str, name: &str) -> anyhow::Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/v1/namespaces/{}/secrets/{}", namespace, name)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => Ok(()),
            s => bail!("deleting secret {}/{} failed: server returned {}", namespace, name, s),
        }
    }

    // ─── Pods ──────────────────────────────────────────────────────────────

    pub async fn create_pod(&self, pod: &Pod) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(self.url("/api/v1/pods"))
            .json(pod)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "creating pod {}/{} failed: server returned {}",
                pod.namespace,
                pod.name,
                resp.status()
            );
        }
        info!("Created pod {}/{}", pod.namespace, pod.name);
        Ok(())
    }

    /// Delete a pod. A pod that is already gone is fine.
    pub async fn delete_pod(&self, namespace: &str, name: &str) -> anyhow::Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/v1/namespaces/{}/pods/{}", namespace, name)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => {
                info!("Deleted pod {}/{}", namespace, name);
                Ok(())
            }
            s => bail!("deleting pod {}/{} failed: server returned {}", namespace, name, s),
        }
    }

    pub async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<Pod>> {
        let resp = self
            .http
            .get(self.url(&format!("/api/v1/namespaces/{}/pods", namespace)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            s if s.is_success() => Ok(resp.json().await?),
            s => bail!("listing pods in '{}' failed: server returned {}", namespace, s),
        }
    }
}
