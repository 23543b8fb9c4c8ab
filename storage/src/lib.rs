pub mod etcd;
pub mod properties;

pub use etcd::{EtcdClient, EtcdClientConfig};
