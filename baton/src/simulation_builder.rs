use std::io::Write;

use crate::{
    Actor, ProcessId, Simulation,
    host::HostRegistry,
    kernel::{Kernel, KernelBridge},
    network::{BandwidthDescription, LatencyDescription, LatencyTopology, Network},
    random::{Randomizer, Seed},
    time::Jiffies,
};

#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let module_path = record.module_path().unwrap_or("unknown");
            let crate_name = module_path.split("::").next().unwrap_or(module_path);
            writeln!(buf, "[{}] {}", crate_name, record.args())
        })
        .try_init();
}

struct Deployment {
    host: String,
    name: String,
    args: Vec<String>,
    actor: Box<dyn Actor>,
}

pub struct SimulationBuilder {
    seed: Seed,
    time_budget: Jiffies,
    first_pid: ProcessId,
    channels: usize,
    hosts: Vec<(String, f64)>,
    latency: Vec<LatencyDescription>,
    bandwidth: BandwidthDescription,
    deployments: Vec<Deployment>,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        SimulationBuilder {
            seed: 69,
            time_budget: Jiffies::MAX,
            first_pid: 1,
            channels: 0,
            hosts: Vec::new(),
            latency: Vec::new(),
            bandwidth: BandwidthDescription::Unbounded,
            deployments: Vec::new(),
        }
    }
}

impl SimulationBuilder {
    /// `speed` is in flop per second.
    pub fn add_host(mut self, name: &str, speed: f64) -> Self {
        assert!(
            speed.is_finite() && speed > 0.0,
            "Host {name} needs a positive speed"
        );
        self.hosts.push((name.to_string(), speed));
        self
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    pub fn time_budget(mut self, time_budget: Jiffies) -> Self {
        self.time_budget = time_budget;
        self
    }

    /// PID of the first process created.
    pub fn first_pid(mut self, pid: ProcessId) -> Self {
        self.first_pid = pid;
        self
    }

    /// Number of legacy channels available on every host.
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn latency_topology(mut self, descriptions: &[LatencyDescription]) -> Self {
        self.latency.extend_from_slice(descriptions);
        self
    }

    pub fn link_bandwidth(mut self, bandwidth: BandwidthDescription) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Process started as soon as the simulation runs, in declaration order.
    pub fn add_process(
        mut self,
        host: &str,
        name: &str,
        args: Vec<String>,
        actor: impl Actor,
    ) -> Self {
        self.deployments.push(Deployment {
            host: host.to_string(),
            name: name.to_string(),
            args,
            actor: Box::new(actor),
        });
        self
    }

    pub fn build(self) -> Simulation {
        init_logger();

        let mut hosts = HostRegistry::default();
        for (name, speed) in &self.hosts {
            hosts.add(name, *speed);
        }

        let latency = LatencyTopology::new(self.latency, Randomizer::new(self.seed));
        let network = Network::new(self.bandwidth, latency);
        let kernel = Kernel::new(self.first_pid, self.channels, hosts, network);

        for d in self.deployments {
            if let Err(e) = kernel.register_process(None, &d.host, &d.name, d.args, d.actor) {
                panic!("Cannot deploy {} on {}: {e}", d.name, d.host);
            }
        }

        Simulation::new(kernel, self.time_budget)
    }
}
