use super::*;
use crate::test_prelude::*;
use crate::transcoder_source::StaticSource;
use futures::future::join_all;
use texture_ingest_basis::TranscodeError;

fn scheduler(worker_count: usize, transcoder: &MockTranscoder) -> TranscodeScheduler {
    let binary = TranscoderBinary::new(Arc::new(StaticSource::new(&b"transcoder"[..])));
    TranscodeScheduler::new(
        SchedulerConfig::inline().with_worker_count(worker_count),
        Arc::new(transcoder.clone()),
        Arc::new(binary),
    )
}

fn blob() -> Arc<[u8]> {
    MockBlob::single(16, 16, 3).encode().into()
}

#[test]
fn transcodes_on_worker_thread() {
    let transcoder = MockTranscoder::new(MockBehavior::default());
    let scheduler = scheduler(1, &transcoder);

    let set = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1)).unwrap();
    assert_eq!(set.basis_format, BasisFormat::Bc1);
    assert_eq!(set.images[0].levels.len(), 3);

    let stats = scheduler.stats();
    assert!(!stats.inline);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.workers.len(), 1);
    assert_eq!(stats.workers[0].state, WorkerState::Ready);
    assert_eq!(stats.workers[0].load, 0);
    assert_eq!(stats.workers[0].dispatched, 1);
}

#[test]
fn balances_requests_across_workers() {
    let gate = MockGate::closed();
    let transcoder = MockTranscoder::new(MockBehavior::default().gated(gate.clone()));
    let scheduler = scheduler(3, &transcoder);

    let pending: Vec<_> = (0..7)
        .map(|_| scheduler.submit(blob(), BasisFormat::Bc3, BasisFormat::Bc1))
        .collect();

    let dispatched: Vec<u64> = scheduler
        .stats()
        .workers
        .iter()
        .map(|worker| worker.dispatched)
        .collect();
    assert_eq!(dispatched, vec![3, 2, 2]);

    gate.open();
    for result in block_on(join_all(pending)) {
        assert!(result.is_ok());
    }
    assert!(scheduler.stats().workers.iter().all(|worker| worker.load == 0));
}

#[rstest]
#[case(2, 5)]
#[case(3, 10)]
#[case(4, 4)]
fn no_worker_gets_two_more_than_another(#[case] workers: usize, #[case] requests: usize) {
    let gate = MockGate::closed();
    let transcoder = MockTranscoder::new(MockBehavior::default().gated(gate.clone()));
    let scheduler = scheduler(workers, &transcoder);

    let pending: Vec<_> = (0..requests)
        .map(|_| scheduler.submit(blob(), BasisFormat::Bc3, BasisFormat::Bc1))
        .collect();
    let floor = (requests / workers) as u64;
    assert!(scheduler
        .stats()
        .workers
        .iter()
        .all(|worker| worker.dispatched >= floor && worker.dispatched <= floor + 1));

    gate.open();
    block_on(join_all(pending));
}

#[test]
fn request_ids_increase_and_one_worker_takes_all() {
    let gate = MockGate::closed();
    let transcoder = MockTranscoder::new(MockBehavior::default().gated(gate.clone()));
    let scheduler = scheduler(1, &transcoder);

    let pending: Vec<_> = (0..3)
        .map(|_| scheduler.submit(blob(), BasisFormat::Bc3, BasisFormat::Bc1))
        .collect();
    let ids: Vec<u64> = pending.iter().filter_map(PendingTranscode::request_id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(pending.iter().all(|pending| pending.worker() == Some(0)));

    gate.open();
    block_on(join_all(pending));
}

#[test]
fn initialization_failure_is_retried_once_then_surfaced() {
    let transcoder = MockTranscoder::new(MockBehavior::default().fail_init());
    let scheduler = scheduler(1, &transcoder);

    let result = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1));
    assert!(matches!(
        result,
        Err(SchedulerError::Worker(WorkerError::InitializationFailed { worker: 1, .. }))
    ));
    assert_eq!(transcoder.instantiations(), 2);
}

#[test]
fn retry_lands_on_replacement_worker() {
    let transcoder = MockTranscoder::new(MockBehavior::default().fail_first_inits(1));
    let scheduler = scheduler(1, &transcoder);

    let set = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1)).unwrap();
    assert_eq!(set.basis_format, BasisFormat::Bc1);
    assert_eq!(transcoder.instantiations(), 2);

    let stats = scheduler.stats();
    let ready: Vec<usize> = stats
        .workers
        .iter()
        .filter(|worker| worker.state == WorkerState::Ready)
        .map(|worker| worker.id)
        .collect();
    assert_eq!(ready, vec![1]);
}

#[test]
fn closed_queue_is_retried_on_a_fresh_worker() {
    let transcoder = MockTranscoder::new(MockBehavior::default());
    let scheduler = scheduler(1, &transcoder);
    block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1)).unwrap();

    // Worker 0 loses its queue; the router may not have seen it exit yet.
    {
        let mut pool = scheduler.pool.lock();
        let (closed, _) = crossbeam_channel::unbounded();
        pool.workers[0].requests = Some(closed);
    }

    let set = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1)).unwrap();
    assert_eq!(set.basis_format, BasisFormat::Bc1);
    assert_eq!(transcoder.instantiations(), 2);

    let ids: Vec<usize> = scheduler
        .stats()
        .workers
        .iter()
        .map(|worker| worker.id)
        .collect();
    assert_eq!(ids, vec![1]);
}

fn ready_slot(id: usize, load: usize) -> (WorkerSlot, Receiver<WorkerRequest>) {
    let (requests, queue) = crossbeam_channel::unbounded();
    let (ready_sender, ready) = oneshot::channel();
    let slot = WorkerSlot {
        id,
        state: WorkerState::Ready,
        load,
        dispatched: load as u64,
        requests: Some(requests),
        ready: ready.shared(),
        ready_sender: Some(ready_sender),
        thread: None,
    };
    (slot, queue)
}

#[test]
fn retired_worker_is_never_chosen_again() {
    let mut pool = PoolState::default();
    let (idle, _idle_queue) = ready_slot(0, 0);
    let (busy, _busy_queue) = ready_slot(1, 3);
    pool.workers = vec![idle, busy];
    let (respond, mut response) = oneshot::channel();
    pool.pending.insert(7, PendingRequest { worker: 0, respond });
    assert_eq!(pool.least_loaded(), Some(0));

    pool.retire(0);

    assert_eq!(pool.least_loaded(), Some(1));
    assert_eq!(pool.workers[0].state, WorkerState::Terminated);
    assert_eq!(pool.workers[0].load, 0);
    assert_eq!(
        response.try_recv(),
        Ok(Some(Err(SchedulerError::Worker(WorkerError::Terminated { worker: 0 }))))
    );
}

#[test]
fn crashed_worker_rejects_its_requests() {
    let transcoder = MockTranscoder::new(MockBehavior::default().panic_on_transcode());
    let scheduler = scheduler(1, &transcoder);

    let result = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1));
    assert!(matches!(
        result,
        Err(SchedulerError::Worker(WorkerError::Terminated { .. }))
    ));
    assert_eq!(scheduler.stats().pending, 0);
}

#[test]
fn transcode_errors_are_not_retried() {
    let transcoder = MockTranscoder::new(MockBehavior::default().fail_all_transcodes());
    let scheduler = scheduler(1, &transcoder);

    let result = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1));
    assert!(matches!(
        result,
        Err(SchedulerError::Transcode(TranscodeError::TranscodeFailed {
            format: BasisFormat::Rgb565,
            ..
        }))
    ));
    assert_eq!(transcoder.sessions(), 1);
}

#[test]
fn inline_mode_uses_the_same_fallback_ladder() {
    let behavior = MockBehavior::default().fail_format(BasisFormat::Bc1);
    let transcoder = MockTranscoder::new(behavior.clone());
    let scheduler = scheduler(0, &transcoder);

    let pending = scheduler.submit(blob(), BasisFormat::Bc3, BasisFormat::Bc1);
    assert_eq!(pending.request_id(), None);
    let set = block_on(pending).unwrap();
    assert!(set.fallback_used);

    let direct = transcode_basis(
        instantiate(behavior).as_ref(),
        &blob(),
        BasisFormat::Bc3,
        BasisFormat::Bc1,
    )
    .unwrap();
    assert_eq!(set, direct);

    let stats = scheduler.stats();
    assert!(stats.inline);
    assert!(stats.workers.is_empty());
    assert_eq!(transcoder.instantiations(), 1);
}

#[test]
fn inline_initialization_failure_is_a_worker_error() {
    let transcoder = MockTranscoder::new(MockBehavior::default().fail_init());
    let scheduler = scheduler(0, &transcoder);

    let result = block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1));
    assert!(matches!(
        result,
        Err(SchedulerError::Worker(WorkerError::InlineInitializationFailed(_)))
    ));
    assert_eq!(transcoder.instantiations(), 2);
}

#[test]
fn unknown_response_leaves_other_requests_alone() {
    let mut pool = PoolState::default();
    let (respond, mut response) = oneshot::channel();
    pool.pending.insert(1, PendingRequest { worker: 0, respond });

    pool.handle(WorkerResponse::Transcode {
        worker: 0,
        request_id: 99,
        result: Err(TranscodeError::EmptyBlob),
    });

    assert!(pool.pending.contains_key(&1));
    assert_eq!(response.try_recv(), Ok(None));
}

#[test]
fn exit_rejects_only_that_workers_requests() {
    let mut pool = PoolState::default();
    let (first, mut first_response) = oneshot::channel();
    let (second, mut second_response) = oneshot::channel();
    pool.pending.insert(1, PendingRequest { worker: 0, respond: first });
    pool.pending.insert(2, PendingRequest { worker: 1, respond: second });

    pool.handle(WorkerResponse::Exited { worker: 0 });

    assert_eq!(
        first_response.try_recv(),
        Ok(Some(Err(SchedulerError::Worker(WorkerError::Terminated { worker: 0 }))))
    );
    assert_eq!(second_response.try_recv(), Ok(None));
    assert_eq!(pool.pending.len(), 1);
}

#[test]
fn dropping_scheduler_joins_workers() {
    let transcoder = MockTranscoder::new(MockBehavior::default());
    let scheduler = scheduler(2, &transcoder);
    block_on(scheduler.transcode(blob(), BasisFormat::Bc3, BasisFormat::Bc1)).unwrap();
    drop(scheduler);
}
