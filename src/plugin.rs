//! The user-facing commands. Everything printed to the terminal comes from
//! here; the layers below only return errors.

use std::io::Write;
use std::sync::Arc;

use crate::cf::{CfConnection, CfService};
use crate::cli::Commands;
use crate::errors::CfMysqlError;
use crate::models::MysqlService;
use crate::mysql::{MysqlRunner, MysqlTarget};
use crate::tunnel::PortFinder;

pub const USAGE: &str = "\
cf-mysql - MySQL clients for Cloud Foundry database services

USAGE:
   cf-mysql list
   cf-mysql mysql <service-name> [mysql args...]
   cf-mysql mysqldump <service-name> [tables...] [mysqldump args...]
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Client {
    Mysql,
    Mysqldump,
}

pub struct MysqlPlugin {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    cf_service: Arc<dyn CfService>,
    mysql_runner: Arc<dyn MysqlRunner>,
    port_finder: Arc<dyn PortFinder>,
}

impl MysqlPlugin {
    pub fn new(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        cf_service: Arc<dyn CfService>,
        mysql_runner: Arc<dyn MysqlRunner>,
        port_finder: Arc<dyn PortFinder>,
    ) -> Self {
        Self {
            out,
            err,
            cf_service,
            mysql_runner,
            port_finder,
        }
    }

    /// Runs one command and returns the process exit code.
    pub async fn run(&mut self, conn: Arc<dyn CfConnection>, command: Commands) -> i32 {
        match command {
            Commands::List => self.list(conn).await,
            Commands::Mysql {
                service: Some(name),
                args,
            } => self.connect(conn, Client::Mysql, &name, &args).await,
            Commands::Mysqldump {
                service: Some(name),
                args,
            } => self.connect(conn, Client::Mysqldump, &name, &args).await,
            Commands::Mysql { service: None, .. } | Commands::Mysqldump { service: None, .. } => {
                let _ = write!(self.err, "{}", USAGE);
                1
            }
        }
    }

    async fn list(&mut self, conn: Arc<dyn CfConnection>) -> i32 {
        let services = match self.cf_service.get_mysql_services(conn).await {
            Ok(services) => services,
            Err(e) => return self.fail(&format!("Unable to retrieve services: {}", e)),
        };

        if services.is_empty() {
            let _ = writeln!(
                self.err,
                "No MySQL databases available. Please bind your database services to a started app to make them available to 'cf-mysql'."
            );
            return 0;
        }

        let _ = writeln!(self.out, "MySQL databases bound to an app:\n");
        for service in &services {
            let _ = writeln!(self.out, "{}", service.name);
        }
        0
    }

    async fn connect(
        &mut self,
        conn: Arc<dyn CfConnection>,
        client: Client,
        name: &str,
        args: &[String],
    ) -> i32 {
        let service = match self.cf_service.get_service(conn.as_ref(), name).await {
            Ok(service) => service,
            Err(e) => return self.fail(&format!("Unable to retrieve service credentials: {}", e)),
        };

        let apps = match self.cf_service.get_started_apps(conn.as_ref()).await {
            Ok(apps) => apps,
            Err(e) => return self.fail(&format!("Unable to retrieve started apps: {}", e)),
        };
        if apps.is_empty() {
            return self.fail(&format!(
                "Unable to connect to '{}': no started apps in current space",
                name
            ));
        }

        let local_port = match self.port_finder.get_port() {
            Ok(port) => port,
            Err(e) => return self.fail(&format!("Unable to find a free local port: {}", e)),
        };

        tracing::info!(service = %name, local_port, apps = apps.len(), "connecting");
        if let Err(e) = self
            .cf_service
            .open_ssh_tunnel(conn, &service, &apps, local_port)
            .await
        {
            return self.fail(&format!("Unable to open tunnel to '{}': {}", name, e));
        }

        match self.run_client(client, &service, local_port, args).await {
            Ok(()) => 0,
            Err(e) => self.fail(&e.to_string()),
        }
    }

    async fn run_client(
        &self,
        client: Client,
        service: &MysqlService,
        local_port: u16,
        args: &[String],
    ) -> Result<(), CfMysqlError> {
        let target = MysqlTarget::through_tunnel(service, local_port);
        match client {
            Client::Mysql => self.mysql_runner.run_mysql(&target, args).await,
            Client::Mysqldump => self.mysql_runner.run_mysqldump(&target, args).await,
        }
    }

    fn fail(&mut self, message: &str) -> i32 {
        let _ = writeln!(self.err, "FAILED\n{}", message);
        1
    }
}
