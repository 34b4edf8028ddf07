use kuryr_cni::commands::{version, Kuryr};
use kuryr_cni::plugin::PluginExec;

fn main() {
    env_logger::builder().format_timestamp(None).init();
    PluginExec::new(Kuryr::default(), version::info()).exec();
}
