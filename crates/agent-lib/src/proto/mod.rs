//! Generated protobuf code
//!
//! Two packages are used by the agent:
//! - `runtime.v1`: the container runtime interface subset we query
//! - `relay.v1`: the snapshot stream sent to the relay
//!
//! With the `proto-gen` feature the code is generated at build time by
//! tonic-build. Otherwise the equivalent message types below are used.

#[cfg(feature = "proto-gen")]
pub mod runtime {
    pub mod v1 {
        tonic::include_proto!("runtime.v1");
    }
}

#[cfg(feature = "proto-gen")]
pub mod relay {
    pub mod v1 {
        tonic::include_proto!("relay.v1");
    }
}

#[cfg(not(feature = "proto-gen"))]
pub mod runtime {
    pub mod v1 {
        use prost::Message;

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum PodSandboxState {
            SandboxReady = 0,
            SandboxNotready = 1,
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum ContainerState {
            ContainerCreated = 0,
            ContainerRunning = 1,
            ContainerExited = 2,
            ContainerUnknown = 3,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct UInt64Value {
            #[prost(uint64, tag = "1")]
            pub value: u64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxStateValue {
            #[prost(enumeration = "PodSandboxState", tag = "1")]
            pub state: i32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxFilter {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(message, optional, tag = "2")]
            pub state: Option<PodSandboxStateValue>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListPodSandboxRequest {
            #[prost(message, optional, tag = "1")]
            pub filter: Option<PodSandboxFilter>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxMetadata {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(string, tag = "2")]
            pub uid: String,
            #[prost(string, tag = "3")]
            pub namespace: String,
            #[prost(uint32, tag = "4")]
            pub attempt: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandbox {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(message, optional, tag = "2")]
            pub metadata: Option<PodSandboxMetadata>,
            #[prost(enumeration = "PodSandboxState", tag = "3")]
            pub state: i32,
            #[prost(int64, tag = "4")]
            pub created_at: i64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListPodSandboxResponse {
            #[prost(message, repeated, tag = "1")]
            pub items: Vec<PodSandbox>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxStatsFilter {
            #[prost(string, tag = "1")]
            pub id: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListPodSandboxStatsRequest {
            #[prost(message, optional, tag = "1")]
            pub filter: Option<PodSandboxStatsFilter>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxAttributes {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(message, optional, tag = "2")]
            pub metadata: Option<PodSandboxMetadata>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct NetworkInterfaceUsage {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(message, optional, tag = "2")]
            pub rx_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "3")]
            pub rx_errors: Option<UInt64Value>,
            #[prost(message, optional, tag = "4")]
            pub tx_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "5")]
            pub tx_errors: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct NetworkUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub default_interface: Option<NetworkInterfaceUsage>,
            #[prost(message, repeated, tag = "3")]
            pub interfaces: Vec<NetworkInterfaceUsage>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ProcessUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub process_count: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct LinuxPodSandboxStats {
            #[prost(message, optional, tag = "1")]
            pub cpu: Option<CpuUsage>,
            #[prost(message, optional, tag = "2")]
            pub memory: Option<MemoryUsage>,
            #[prost(message, optional, tag = "3")]
            pub network: Option<NetworkUsage>,
            #[prost(message, optional, tag = "4")]
            pub process: Option<ProcessUsage>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodSandboxStats {
            #[prost(message, optional, tag = "1")]
            pub attributes: Option<PodSandboxAttributes>,
            #[prost(message, optional, tag = "2")]
            pub linux: Option<LinuxPodSandboxStats>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListPodSandboxStatsResponse {
            #[prost(message, repeated, tag = "1")]
            pub stats: Vec<PodSandboxStats>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerStateValue {
            #[prost(enumeration = "ContainerState", tag = "1")]
            pub state: i32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerFilter {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(message, optional, tag = "2")]
            pub state: Option<ContainerStateValue>,
            #[prost(string, tag = "3")]
            pub pod_sandbox_id: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListContainersRequest {
            #[prost(message, optional, tag = "1")]
            pub filter: Option<ContainerFilter>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerMetadata {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(uint32, tag = "2")]
            pub attempt: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ImageSpec {
            #[prost(string, tag = "1")]
            pub image: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct Container {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(string, tag = "2")]
            pub pod_sandbox_id: String,
            #[prost(message, optional, tag = "3")]
            pub metadata: Option<ContainerMetadata>,
            #[prost(message, optional, tag = "4")]
            pub image: Option<ImageSpec>,
            #[prost(string, tag = "5")]
            pub image_ref: String,
            #[prost(enumeration = "ContainerState", tag = "6")]
            pub state: i32,
            #[prost(int64, tag = "7")]
            pub created_at: i64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListContainersResponse {
            #[prost(message, repeated, tag = "1")]
            pub containers: Vec<Container>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerStatsFilter {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(string, tag = "2")]
            pub pod_sandbox_id: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListContainerStatsRequest {
            #[prost(message, optional, tag = "1")]
            pub filter: Option<ContainerStatsFilter>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerAttributes {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(message, optional, tag = "2")]
            pub metadata: Option<ContainerMetadata>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct CpuUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub usage_core_nano_seconds: Option<UInt64Value>,
            #[prost(message, optional, tag = "3")]
            pub usage_nano_cores: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct MemoryUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub working_set_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "3")]
            pub available_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "4")]
            pub usage_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "5")]
            pub rss_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "6")]
            pub page_faults: Option<UInt64Value>,
            #[prost(message, optional, tag = "7")]
            pub major_page_faults: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct FilesystemIdentifier {
            #[prost(string, tag = "1")]
            pub mountpoint: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct FilesystemUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub fs_id: Option<FilesystemIdentifier>,
            #[prost(message, optional, tag = "3")]
            pub used_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "4")]
            pub inodes_used: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct SwapUsage {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub swap_available_bytes: Option<UInt64Value>,
            #[prost(message, optional, tag = "3")]
            pub swap_usage_bytes: Option<UInt64Value>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerStats {
            #[prost(message, optional, tag = "1")]
            pub attributes: Option<ContainerAttributes>,
            #[prost(message, optional, tag = "2")]
            pub cpu: Option<CpuUsage>,
            #[prost(message, optional, tag = "3")]
            pub memory: Option<MemoryUsage>,
            #[prost(message, optional, tag = "4")]
            pub writable_layer: Option<FilesystemUsage>,
            #[prost(message, optional, tag = "5")]
            pub swap: Option<SwapUsage>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ListContainerStatsResponse {
            #[prost(message, repeated, tag = "1")]
            pub stats: Vec<ContainerStats>,
        }

        pub mod runtime_service_client {
            use super::*;
            use tonic::codegen::*;

            #[derive(Debug, Clone)]
            pub struct RuntimeServiceClient<T> {
                inner: tonic::client::Grpc<T>,
            }

            impl RuntimeServiceClient<tonic::transport::Channel> {
                pub fn new(channel: tonic::transport::Channel) -> Self {
                    let inner = tonic::client::Grpc::new(channel);
                    Self { inner }
                }
            }

            impl<T> RuntimeServiceClient<T>
            where
                T: tonic::client::GrpcService<tonic::body::BoxBody>,
                T::Error: Into<StdError>,
                T::ResponseBody: Body<Data = Bytes> + Send + 'static,
                <T::ResponseBody as Body>::Error: Into<StdError> + Send,
            {
                async fn ready(&mut self) -> Result<(), tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e.into()),
                        )
                    })
                }

                pub async fn list_pod_sandbox(
                    &mut self,
                    request: impl tonic::IntoRequest<ListPodSandboxRequest>,
                ) -> Result<tonic::Response<ListPodSandboxResponse>, tonic::Status> {
                    self.ready().await?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/runtime.v1.RuntimeService/ListPodSandbox",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn list_pod_sandbox_stats(
                    &mut self,
                    request: impl tonic::IntoRequest<ListPodSandboxStatsRequest>,
                ) -> Result<tonic::Response<ListPodSandboxStatsResponse>, tonic::Status> {
                    self.ready().await?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/runtime.v1.RuntimeService/ListPodSandboxStats",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn list_containers(
                    &mut self,
                    request: impl tonic::IntoRequest<ListContainersRequest>,
                ) -> Result<tonic::Response<ListContainersResponse>, tonic::Status> {
                    self.ready().await?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/runtime.v1.RuntimeService/ListContainers",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn list_container_stats(
                    &mut self,
                    request: impl tonic::IntoRequest<ListContainerStatsRequest>,
                ) -> Result<tonic::Response<ListContainerStatsResponse>, tonic::Status> {
                    self.ready().await?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/runtime.v1.RuntimeService/ListContainerStats",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }
            }
        }
    }
}

#[cfg(not(feature = "proto-gen"))]
pub mod relay {
    pub mod v1 {
        use prost::Message;

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum PodState {
            Unknown = 0,
            Ready = 1,
            NotReady = 2,
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum ContainerState {
            Unknown = 0,
            Created = 1,
            Running = 2,
            Exited = 3,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct Ack {
            #[prost(string, tag = "1")]
            pub message: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct Metrics {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(message, optional, tag = "2")]
            pub node_metrics: Option<NodeMetrics>,
            #[prost(message, repeated, tag = "3")]
            pub pod_metrics: Vec<PodMetrics>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct NodeMetrics {
            #[prost(string, tag = "1")]
            pub hostname: String,
            #[prost(uint64, tag = "2")]
            pub uptime: u64,
            #[prost(uint64, tag = "3")]
            pub boot_time: u64,
            #[prost(uint64, tag = "4")]
            pub procs: u64,
            #[prost(string, tag = "5")]
            pub os: String,
            #[prost(string, tag = "6")]
            pub platform: String,
            #[prost(string, tag = "7")]
            pub platform_version: String,
            #[prost(string, tag = "8")]
            pub kernel_version: String,
            #[prost(string, tag = "9")]
            pub kernel_arch: String,
            #[prost(string, tag = "10")]
            pub host_id: String,
            #[prost(double, tag = "11")]
            pub total_cpu_percentage: f64,
            #[prost(uint32, optional, tag = "12")]
            pub physical_cores: Option<u32>,
            #[prost(message, repeated, tag = "13")]
            pub cpu_infos: Vec<CpuInfo>,
            #[prost(uint64, tag = "14")]
            pub total_memory: u64,
            #[prost(uint64, tag = "15")]
            pub available_memory: u64,
            #[prost(uint64, tag = "16")]
            pub used_memory: u64,
            #[prost(uint64, tag = "17")]
            pub free_memory: u64,
            #[prost(double, tag = "18")]
            pub memory_used_perc: f64,
            #[prost(message, optional, tag = "19")]
            pub net_usage: Option<NetUsage>,
            #[prost(message, repeated, tag = "20")]
            pub network_interfaces: Vec<InterfaceStat>,
            #[prost(message, repeated, tag = "21")]
            pub disk_usages: Vec<DiskUsage>,
            #[prost(message, optional, tag = "22")]
            pub disk_io_summary: Option<DiskIoSummary>,
            #[prost(message, optional, tag = "23")]
            pub psi_cpu_metrics: Option<PsiMetrics>,
            #[prost(message, optional, tag = "24")]
            pub psi_memory_metrics: Option<PsiMetrics>,
            #[prost(message, optional, tag = "25")]
            pub psi_io_metrics: Option<PsiMetrics>,
            #[prost(message, repeated, tag = "26")]
            pub top_mem: Vec<ProcessMemInfo>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct CpuInfo {
            #[prost(uint32, tag = "1")]
            pub cpu: u32,
            #[prost(string, tag = "2")]
            pub model: String,
            #[prost(string, tag = "3")]
            pub vendor_id: String,
            #[prost(uint64, tag = "4")]
            pub mhz: u64,
            #[prost(double, tag = "5")]
            pub usage: f64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct NetUsage {
            #[prost(uint64, tag = "1")]
            pub total_bytes_sent: u64,
            #[prost(uint64, tag = "2")]
            pub total_bytes_received: u64,
            #[prost(uint64, tag = "3")]
            pub total_packets_sent: u64,
            #[prost(uint64, tag = "4")]
            pub total_packets_received: u64,
            #[prost(uint64, tag = "5")]
            pub total_err_in: u64,
            #[prost(uint64, tag = "6")]
            pub total_err_out: u64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct InterfaceStat {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(string, tag = "2")]
            pub hardware_addr: String,
            #[prost(string, repeated, tag = "3")]
            pub addrs: Vec<String>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct DiskUsage {
            #[prost(string, tag = "1")]
            pub device: String,
            #[prost(string, tag = "2")]
            pub mountpoint: String,
            #[prost(string, tag = "3")]
            pub fstype: String,
            #[prost(uint64, tag = "4")]
            pub total: u64,
            #[prost(uint64, tag = "5")]
            pub free: u64,
            #[prost(uint64, tag = "6")]
            pub used: u64,
            #[prost(double, tag = "7")]
            pub used_percent: f64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct DiskIoSummary {
            #[prost(uint64, tag = "1")]
            pub total_read_bytes: u64,
            #[prost(uint64, tag = "2")]
            pub total_write_bytes: u64,
            #[prost(uint64, tag = "3")]
            pub total_read_ops: u64,
            #[prost(uint64, tag = "4")]
            pub total_write_ops: u64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PsiData {
            #[prost(double, tag = "1")]
            pub avg10: f64,
            #[prost(double, tag = "2")]
            pub avg60: f64,
            #[prost(double, tag = "3")]
            pub avg300: f64,
            #[prost(uint64, tag = "4")]
            pub total: u64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PsiMetrics {
            #[prost(message, optional, tag = "1")]
            pub some: Option<PsiData>,
            #[prost(message, optional, tag = "2")]
            pub full: Option<PsiData>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ProcessMemInfo {
            #[prost(uint32, tag = "1")]
            pub pid: u32,
            #[prost(string, tag = "2")]
            pub name: String,
            #[prost(uint64, tag = "3")]
            pub memory: u64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodMetrics {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(string, tag = "2")]
            pub uid: String,
            #[prost(string, tag = "3")]
            pub name: String,
            #[prost(string, tag = "4")]
            pub namespace: String,
            #[prost(int64, tag = "5")]
            pub created_at: i64,
            #[prost(enumeration = "PodState", tag = "6")]
            pub state: i32,
            #[prost(uint32, tag = "7")]
            pub attempt: u32,
            #[prost(message, repeated, tag = "8")]
            pub container_metrics: Vec<ContainerMetrics>,
            #[prost(message, optional, tag = "9")]
            pub usage: Option<PodUsage>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct PodUsage {
            #[prost(message, optional, tag = "1")]
            pub cpu_metrics: Option<CpuMetrics>,
            #[prost(message, optional, tag = "2")]
            pub memory_metrics: Option<MemoryMetrics>,
            #[prost(uint64, optional, tag = "3")]
            pub network_rx_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "4")]
            pub network_tx_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "5")]
            pub process_count: Option<u64>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct ContainerMetrics {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(string, tag = "2")]
            pub name: String,
            #[prost(string, tag = "3")]
            pub image: String,
            #[prost(int64, tag = "4")]
            pub created_at: i64,
            #[prost(enumeration = "ContainerState", tag = "5")]
            pub state: i32,
            #[prost(uint32, tag = "6")]
            pub attempt: u32,
            #[prost(message, optional, tag = "7")]
            pub cpu_metrics: Option<CpuMetrics>,
            #[prost(message, optional, tag = "8")]
            pub memory_metrics: Option<MemoryMetrics>,
            #[prost(message, optional, tag = "9")]
            pub file_system_metrics: Option<FileSystemMetrics>,
            #[prost(message, optional, tag = "10")]
            pub swap_metrics: Option<SwapMetrics>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct CpuMetrics {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(uint64, optional, tag = "2")]
            pub usage_core_nano_seconds: Option<u64>,
            #[prost(uint64, optional, tag = "3")]
            pub usage_nano_cores: Option<u64>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct MemoryMetrics {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(uint64, optional, tag = "2")]
            pub working_set_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "3")]
            pub available_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "4")]
            pub usage_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "5")]
            pub rss_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "6")]
            pub page_faults: Option<u64>,
            #[prost(uint64, optional, tag = "7")]
            pub major_page_faults: Option<u64>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct FileSystemMetrics {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(string, optional, tag = "2")]
            pub mountpoint: Option<String>,
            #[prost(uint64, optional, tag = "3")]
            pub used_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "4")]
            pub inodes_used: Option<u64>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct SwapMetrics {
            #[prost(int64, tag = "1")]
            pub timestamp: i64,
            #[prost(uint64, optional, tag = "2")]
            pub swap_available_bytes: Option<u64>,
            #[prost(uint64, optional, tag = "3")]
            pub swap_usage_bytes: Option<u64>,
        }

        pub mod metrics_service_client {
            use super::*;
            use tonic::codegen::*;

            #[derive(Debug, Clone)]
            pub struct MetricsServiceClient<T> {
                inner: tonic::client::Grpc<T>,
            }

            impl MetricsServiceClient<tonic::transport::Channel> {
                pub fn new(channel: tonic::transport::Channel) -> Self {
                    let inner = tonic::client::Grpc::new(channel);
                    Self { inner }
                }
            }

            impl<T> MetricsServiceClient<T>
            where
                T: tonic::client::GrpcService<tonic::body::BoxBody>,
                T::Error: Into<StdError>,
                T::ResponseBody: Body<Data = Bytes> + Send + 'static,
                <T::ResponseBody as Body>::Error: Into<StdError> + Send,
            {
                pub async fn send_metrics(
                    &mut self,
                    request: impl tonic::IntoStreamingRequest<Message = Metrics>,
                ) -> Result<tonic::Response<Ack>, tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e.into()),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/relay.v1.MetricsService/SendMetrics",
                    );
                    self.inner
                        .client_streaming(request.into_streaming_request(), path, codec)
                        .await
                }
            }
        }
    }
}

pub use relay::v1::metrics_service_client::MetricsServiceClient;
pub use runtime::v1::runtime_service_client::RuntimeServiceClient;
