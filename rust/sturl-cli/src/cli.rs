use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "sturl")]
#[command(bin_name = "sturl")]
#[command(about = "Authorized requests against the store API", long_about = None)]
pub struct SturlCli {
    /// Persist the authorization under this name and reuse it on later runs
    #[arg(short = 'a', long = "auth")]
    pub auth: Option<String>,

    /// Email address to authenticate as (defaults to $STORE_EMAIL)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Store environment: staging, production or local (defaults to $STORE_ENV)
    #[arg(short = 's', long = "store")]
    pub store_env: Option<String>,

    /// Permission to request on the root token (repeatable)
    #[arg(short, long = "permission")]
    pub permissions: Vec<String>,

    /// Channel to confine the authorization to (repeatable)
    #[arg(short, long = "channel")]
    pub channels: Vec<String>,

    /// Re-authorize even when a stored credential exists
    #[arg(long)]
    pub force: bool,

    /// List stored authorizations and exit
    #[arg(long = "list-auth")]
    pub list_auth: bool,

    /// Print the response status line and headers
    #[arg(short = 'I', long)]
    pub print_headers: bool,

    /// HTTP method for the forwarded request
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON request body, inline or @path-to-file (implies POST)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Additional request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Verbose protocol logging
    #[arg(short = 'v', long)]
    pub debug: bool,

    /// Target URL; defaults to the ACL verification endpoint
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_a_typical_authorization_run() {
        let cli = SturlCli::try_parse_from([
            "sturl",
            "-a",
            "work",
            "-e",
            "foo@bar.com",
            "-s",
            "production",
            "-p",
            "package_access",
            "-p",
            "package_upload",
        ])
        .unwrap();

        assert_eq!(cli.auth.as_deref(), Some("work"));
        assert_eq!(cli.email.as_deref(), Some("foo@bar.com"));
        assert_eq!(cli.store_env.as_deref(), Some("production"));
        assert_eq!(cli.permissions, vec!["package_access", "package_upload"]);
        assert_eq!(cli.method, "GET");
        assert!(cli.url.is_none());
    }

    #[test]
    fn it_parses_a_forwarded_request() {
        let cli = SturlCli::try_parse_from([
            "sturl",
            "-a",
            "work",
            "-X",
            "POST",
            "-d",
            r#"{"snap_name": "sturl"}"#,
            "-H",
            "X-Trace: 1",
            "-I",
            "https://example.test/dev/api/register-name/",
        ])
        .unwrap();

        assert_eq!(cli.method, "POST");
        assert!(cli.print_headers);
        assert_eq!(cli.headers, vec!["X-Trace: 1"]);
        assert_eq!(
            cli.url.as_deref(),
            Some("https://example.test/dev/api/register-name/")
        );
    }
}
